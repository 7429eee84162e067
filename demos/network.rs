// Copyright 2020 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under the MIT license <LICENSE-MIT
// http://opensource.org/licenses/MIT> or the Modified BSD license <LICENSE-BSD
// https://opensource.org/licenses/BSD-3-Clause>, at your option. This file may not be copied,
// modified, or distributed except according to those terms. Please review the Licences for the
// specific language governing permissions and limitations relating to use of the SAFE Network
// Software.

//! Runs a local network of gossiping nodes.
//!
//! Each node runs two OS threads sharing one `RumorHolder` behind an `Arc`: an inbound thread
//! that drains its mailbox and answers with pulls, and a ticker thread that calls
//! `advance_round` on a fixed interval and pushes the result onward.  This mirrors the crate's
//! documented concurrency model directly (see `lib.rs`): a `RumorHolder` is accessed concurrently
//! by at least one network-inbound thread and one timer thread, synchronised only by its own
//! internal mutex.

#[macro_use]
extern crate log;

use rand::Rng;
use rumor_spreading_core::{wire, Message, PeerId, RumorHolder, RumorId, StatisticKey};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const NODE_COUNT: usize = 16;
const TICK_INTERVAL: Duration = Duration::from_millis(15);
const RUN_DURATION: Duration = Duration::from_secs(2);

type Mailbox = (Sender<(PeerId, Vec<u8>)>, Receiver<(PeerId, Vec<u8>)>);

fn main() {
    env_logger::init();

    let mut mailboxes: HashMap<PeerId, Mailbox> = HashMap::new();
    let peers: Vec<PeerId> = (0..NODE_COUNT as i64).map(PeerId).collect();
    for &peer in &peers {
        let _ = mailboxes.insert(peer, mpsc::channel());
    }
    let senders: HashMap<PeerId, Sender<(PeerId, Vec<u8>)>> = mailboxes
        .iter()
        .map(|(&peer, (tx, _))| (peer, tx.clone()))
        .collect();

    let holders: HashMap<PeerId, Arc<RumorHolder>> = peers
        .iter()
        .map(|&peer| (peer, Arc::new(RumorHolder::new(peers.clone(), peer))))
        .collect();

    let origin = peers[rand::thread_rng().gen_range(0..peers.len())];
    let rumor_id = RumorId::from(1);
    assert!(holders[&origin].add_rumor(rumor_id));
    println!("node {} injects rumor {:?}", origin.0, rumor_id);

    let shutdown = Arc::new(AtomicBool::new(false));
    let mut join_handles = Vec::new();

    for (peer, (_, rx)) in mailboxes {
        let holder = Arc::clone(&holders[&peer]);
        let thread_senders = senders.clone();
        let thread_shutdown = Arc::clone(&shutdown);
        join_handles.push(thread::spawn(move || {
            inbound_loop(holder, rx, thread_senders, thread_shutdown)
        }));

        let holder = Arc::clone(&holders[&peer]);
        let thread_senders = senders.clone();
        let thread_shutdown = Arc::clone(&shutdown);
        join_handles.push(thread::spawn(move || {
            ticker_loop(holder, thread_senders, thread_shutdown)
        }));
    }

    thread::sleep(RUN_DURATION);
    shutdown.store(true, Ordering::SeqCst);
    for handle in join_handles {
        let _ = handle.join();
    }

    report(&holders, rumor_id);
}

fn inbound_loop(
    holder: Arc<RumorHolder>,
    rx: Receiver<(PeerId, Vec<u8>)>,
    senders: HashMap<PeerId, Sender<(PeerId, Vec<u8>)>>,
    shutdown: Arc<AtomicBool>,
) {
    while !shutdown.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(20)) {
            Ok((from, bytes)) => {
                let message = match wire::decode(&bytes) {
                    Ok(message) => message,
                    Err(err) => {
                        error!("dropping malformed message from {:?}: {}", from, err);
                        continue;
                    }
                };
                let (reply_to, replies) = holder.received_message(message, from);
                for reply in replies {
                    send(&senders, holder.id(), reply_to, &reply);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

fn ticker_loop(
    holder: Arc<RumorHolder>,
    senders: HashMap<PeerId, Sender<(PeerId, Vec<u8>)>>,
    shutdown: Arc<AtomicBool>,
) {
    while !shutdown.load(Ordering::SeqCst) {
        thread::sleep(TICK_INTERVAL);
        let (to_peer, pushes) = holder.advance_round();
        for push in pushes {
            send(&senders, holder.id(), to_peer, &push);
        }
    }
}

fn send(senders: &HashMap<PeerId, Sender<(PeerId, Vec<u8>)>>, from: PeerId, to: PeerId, message: &Message) {
    let bytes = match wire::encode(message) {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("failed to encode message: {}", err);
            return;
        }
    };
    if let Some(sender) = senders.get(&to) {
        let _ = sender.send((from, bytes));
    }
}

fn report(holders: &HashMap<PeerId, Arc<RumorHolder>>, rumor_id: RumorId) {
    let informed = holders.values().filter(|h| h.rumor_exists(rumor_id)).count();
    println!("{}/{} nodes learned rumor {:?}", informed, holders.len(), rumor_id);

    let rounds: Vec<f64> = holders
        .values()
        .map(|h| h.statistics().get(StatisticKey::Rounds))
        .collect();
    println!("average rounds run per node: {:.1}", average(&rounds));
    println!("median rounds run per node: {:.1}", median(&rounds));

    for holder in holders.values() {
        println!("{}", holder.print_statistics());
    }
}

fn average(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    sorted[sorted.len() / 2]
}
