// Copyright 2020 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under the MIT license <LICENSE-MIT
// http://opensource.org/licenses/MIT> or the Modified BSD license <LICENSE-BSD
// https://opensource.org/licenses/BSD-3-Clause>, at your option. This file may not be copied,
// modified, or distributed except according to those terms. Please review the Licences for the
// specific language governing permissions and limitations relating to use of the SAFE Network
// Software.

use crate::config::NetworkConfig;
use crate::error::Error;
use crate::id::{PeerId, RumorId};
use crate::message::{Message, MessageType};
use crate::state::RumorStateMachine;
use crate::statistics::{StatisticKey, Statistics};
use rand::seq::SliceRandom;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// A deterministic peer chooser, injected at construction to replace random peer selection in
/// tests.  Must be `Send + Sync` since `advance_round` may be called from any thread.
pub type NextMemberCb = Arc<dyn Fn() -> PeerId + Send + Sync>;

/// The sentinel returned as `to_peer`/`reply_to` when there is no membership to address.
const NO_PEER: PeerId = PeerId(-1);

/// The mutable state of a `RumorHolder`, guarded by a single mutex.  Bundling these three fields
/// together means one lock acquisition covers the whole critical section for every public
/// mutating operation, matching the original's single coarse-grained mutex.
#[derive(Debug, Clone, Default)]
struct HolderState {
    rumors: HashMap<RumorId, RumorStateMachine>,
    peers_in_current_round: BTreeSet<PeerId>,
    statistics: Statistics,
}

/// Per-node gossip engine: owns the membership set, the rumor map, round state and statistics for
/// one node, and exposes the three operations an external transport/ticker drive it with:
/// `add_rumor`, `received_message`, `advance_round`.
pub struct RumorHolder {
    self_id: PeerId,
    network_config: NetworkConfig,
    peers: Vec<PeerId>,
    next_member_cb: Option<NextMemberCb>,
    inner: Mutex<HolderState>,
}

impl RumorHolder {
    /// Constructs a holder whose `NetworkConfig` is derived automatically from the membership
    /// size (excluding `self_id`, which is filtered out of `peers` if present).
    pub fn new(peers: impl IntoIterator<Item = PeerId>, self_id: PeerId) -> Self {
        let peers = Self::exclude_self(peers, self_id);
        let config = NetworkConfig::new(peers.len());
        Self::from_parts(peers, self_id, config)
    }

    /// Constructs a holder with an explicit `NetworkConfig`.  Fails if `config.network_size()`
    /// doesn't match the membership size after excluding `self_id`.
    pub fn with_network_config(
        peers: impl IntoIterator<Item = PeerId>,
        self_id: PeerId,
        config: NetworkConfig,
    ) -> Result<Self, Error> {
        let peers = Self::exclude_self(peers, self_id);
        if config.network_size() != peers.len() {
            return Err(Error::ConfigMismatch(peers.len(), config.network_size()));
        }
        Ok(Self::from_parts(peers, self_id, config))
    }

    /// Installs a deterministic peer chooser, overriding uniform random selection in
    /// `advance_round`.  Chainable onto either constructor above, giving all four construction
    /// forms the original C++ exposes as overloads.
    pub fn with_next_member_cb<F>(mut self, cb: F) -> Self
    where
        F: Fn() -> PeerId + Send + Sync + 'static,
    {
        self.next_member_cb = Some(Arc::new(cb));
        self
    }

    fn exclude_self(peers: impl IntoIterator<Item = PeerId>, self_id: PeerId) -> Vec<PeerId> {
        let mut seen = HashSet::new();
        peers
            .into_iter()
            .filter(|peer| *peer != self_id && seen.insert(*peer))
            .collect()
    }

    fn from_parts(peers: Vec<PeerId>, self_id: PeerId, network_config: NetworkConfig) -> Self {
        let mut statistics = Statistics::new();
        statistics.increase(StatisticKey::NumPeers, peers.len() as f64);
        Self {
            self_id,
            network_config,
            peers,
            next_member_cb: None,
            inner: Mutex::new(HolderState {
                rumors: HashMap::new(),
                peers_in_current_round: BTreeSet::new(),
                statistics,
            }),
        }
    }

    /// Inserts a fresh rumor.  Returns `true` if newly inserted, `false` if it already existed
    /// (idempotent).
    pub fn add_rumor(&self, rumor_id: RumorId) -> bool {
        trace!("add_rumor({:?})", rumor_id);
        let mut state = self.inner.lock().expect("RumorHolder mutex poisoned");
        match state.rumors.entry(rumor_id) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(entry) => {
                let _ = entry.insert(RumorStateMachine::new(self.network_config));
                true
            }
        }
    }

    /// Processes an incoming message from `from_peer`, returning the peer to reply to together
    /// with any reply messages (pulls, or a single empty-pull).
    pub fn received_message(&self, message: Message, from_peer: PeerId) -> (PeerId, Vec<Message>) {
        trace!("received_message({:?}, {:?})", message, from_peer);
        let mut state = self.inner.lock().expect("RumorHolder mutex poisoned");

        state.statistics.increase(StatisticKey::NumMessagesReceived, 1.0);
        let is_new_peer = state.peers_in_current_round.insert(from_peer);

        let mut replies = Vec::new();
        if is_new_peer && matches!(message.kind(), MessageType::Push | MessageType::EmptyPush) {
            for (&rumor_id, rumor) in state.rumors.iter() {
                if rumor.age() > 0 && !rumor.is_old() {
                    replies.push(Message::new(MessageType::Pull, rumor_id, rumor.age()));
                }
            }
            if replies.is_empty() {
                replies.push(Message::empty(MessageType::EmptyPull));
                state.statistics.increase(StatisticKey::NumEmptyPullMessages, 1.0);
            } else {
                state
                    .statistics
                    .increase(StatisticKey::NumPullMessages, replies.len() as f64);
            }
        }

        let rumor_id = message.rumor_id();
        if rumor_id.is_some() {
            match state.rumors.get_mut(&rumor_id) {
                Some(rumor) => rumor.rumor_received(from_peer, message.age()),
                None => {
                    let _ = state.rumors.insert(
                        rumor_id,
                        RumorStateMachine::new_from_peer(self.network_config, from_peer, message.age()),
                    );
                }
            }
        }

        (from_peer, replies)
    }

    /// Advances every rumor by one round and returns a peer to push to together with the push
    /// messages for all non-`Old` rumors (or a single empty-push if none are pending).  Returns
    /// `(NO_PEER, [])` if the membership is empty.
    pub fn advance_round(&self) -> (PeerId, Vec<Message>) {
        trace!("advance_round()");
        if self.peers.is_empty() {
            return (NO_PEER, Vec::new());
        }

        let mut state = self.inner.lock().expect("RumorHolder mutex poisoned");
        state.statistics.increase(StatisticKey::Rounds, 1.0);

        let to_peer = match &self.next_member_cb {
            Some(cb) => cb(),
            None => self.choose_random_peer(),
        };

        let mut pushes = Vec::new();
        for (&rumor_id, rumor) in state.rumors.iter_mut() {
            rumor.advance_round();
            if !rumor.is_old() {
                pushes.push(Message::new(MessageType::Push, rumor_id, rumor.age()));
            }
        }
        state
            .statistics
            .increase(StatisticKey::NumPushMessages, pushes.len() as f64);

        if pushes.is_empty() {
            pushes.push(Message::empty(MessageType::EmptyPush));
            state.statistics.increase(StatisticKey::NumEmptyPushMessages, 1.0);
        }

        state.peers_in_current_round.clear();
        (to_peer, pushes)
    }

    fn choose_random_peer(&self) -> PeerId {
        *self
            .peers
            .choose(&mut rand::thread_rng())
            .expect("advance_round already returned early for empty membership")
    }

    /// Whether `rumor_id` is known to this node.
    pub fn rumor_exists(&self, rumor_id: RumorId) -> bool {
        let state = self.inner.lock().expect("RumorHolder mutex poisoned");
        state.rumors.contains_key(&rumor_id)
    }

    /// This node's own id.  Immutable, so reading it never needs the lock.
    pub fn id(&self) -> PeerId {
        self.self_id
    }

    /// This node's `NetworkConfig`.  Immutable, so reading it never needs the lock.
    pub fn network_config(&self) -> NetworkConfig {
        self.network_config
    }

    /// This node's fixed membership, excluding itself.
    pub fn peers(&self) -> &[PeerId] {
        &self.peers
    }

    /// A snapshot of the rumor map.  Intended for quiescent inspection (e.g. end-of-run
    /// reporting); concurrent callers must arrange their own external synchronization if they
    /// need a view consistent with other concurrently-running operations.
    pub fn rumors_map(&self) -> HashMap<RumorId, RumorStateMachine> {
        let state = self.inner.lock().expect("RumorHolder mutex poisoned");
        state.rumors.clone()
    }

    /// A snapshot of the accumulated statistics.  Same quiescent-inspection caveat as
    /// `rumors_map`.
    pub fn statistics(&self) -> Statistics {
        let state = self.inner.lock().expect("RumorHolder mutex poisoned");
        state.statistics.clone()
    }

    /// Formats this node's id and statistics for reporting.
    pub fn print_statistics(&self) -> String {
        format!("{}: {}", self.self_id.0, self.statistics())
    }
}

impl Clone for RumorHolder {
    /// Produces an independent copy: a value-copy of all per-node state, with a fresh, unshared
    /// mutex.  The `next_member_cb`, if any, is shared via `Arc` since it's stateless logic, not
    /// mutable per-node state.
    fn clone(&self) -> Self {
        let state = self.inner.lock().expect("RumorHolder mutex poisoned");
        Self {
            self_id: self.self_id,
            network_config: self.network_config,
            peers: self.peers.clone(),
            next_member_cb: self.next_member_cb.clone(),
            inner: Mutex::new(state.clone()),
        }
    }
}

impl PartialEq for RumorHolder {
    fn eq(&self, other: &Self) -> bool {
        self.self_id == other.self_id
    }
}
impl Eq for RumorHolder {}
