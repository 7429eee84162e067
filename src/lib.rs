// Copyright 2020 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under the MIT license <LICENSE-MIT
// http://opensource.org/licenses/MIT> or the Modified BSD license <LICENSE-BSD
// https://opensource.org/licenses/BSD-3-Clause>, at your option. This file may not be copied,
// modified, or distributed except according to those terms. Please review the Licences for the
// specific language governing permissions and limitations relating to use of the SAFE Network
// Software.

//! A per-node engine implementing randomized push-pull gossip ("rumor mongering") over a fixed
//! membership set.  Each node holds a collection of rumors, each tracked by an independent state
//! machine whose age advances on round ticks and whose termination is governed by epidemic-style
//! thresholds.  Peers converge to a common view of all rumors within `O(log N)` rounds with high
//! probability.
//!
//! This crate is the core engine only: it has no opinion on network transport, wall-clock
//! scheduling, wire serialization or logging sinks.  An external transport calls
//! [`RumorHolder::received_message`] whenever a peer message arrives; an external ticker calls
//! [`RumorHolder::advance_round`] periodically.  See `demos/network.rs` for a worked example
//! driving several nodes over OS threads.

#![forbid(
    arithmetic_overflow,
    mutable_transmutes,
    no_mangle_const_items,
    unknown_crate_types
)]
#![deny(
    bad_style,
    improper_ctypes,
    non_shorthand_field_patterns,
    overflowing_literals,
    stable_features,
    unconditional_recursion,
    unknown_lints,
    unsafe_code,
    unused_allocation,
    unused_attributes,
    unused_comparisons,
    unused_features,
    unused_parens,
    while_true
)]
#![warn(
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate quick_error;
#[macro_use]
extern crate log;

mod config;
mod error;
mod holder;
mod id;
mod message;
mod state;
mod statistics;
pub mod wire;

pub use crate::config::NetworkConfig;
pub use crate::error::Error;
pub use crate::holder::{NextMemberCb, RumorHolder};
pub use crate::id::{PeerId, RumorId};
pub use crate::message::{Message, MessageType};
pub use crate::state::{Phase, RumorStateMachine};
pub use crate::statistics::{StatisticKey, Statistics};
