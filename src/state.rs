// Copyright 2020 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under the MIT license <LICENSE-MIT
// http://opensource.org/licenses/MIT> or the Modified BSD license <LICENSE-BSD
// https://opensource.org/licenses/BSD-3-Clause>, at your option. This file may not be copied,
// modified, or distributed except according to those terms. Please review the Licences for the
// specific language governing permissions and limitations relating to use of the SAFE Network
// Software.

use crate::config::NetworkConfig;
use crate::id::PeerId;
use std::collections::BTreeMap;

/// A rumor's lifecycle phase.  Transitions are strictly forward: `New -> B -> C -> Old`.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Just created locally, hasn't entered the exponential-growth phase yet.
    New,
    /// Exponential-growth phase: we actively seek out oblivious peers.
    B,
    /// Quadratic-shrinking phase: we believe most peers already know this rumor.
    C,
    /// Propagation complete; no further pushes are emitted for this rumor.
    Old,
}

/// Per-rumor state machine.  Tracks phase, age and the epidemic bookkeeping that decides when a
/// rumor has propagated widely enough to retire.
#[derive(Debug, Clone)]
pub struct RumorStateMachine {
    config: NetworkConfig,
    phase: Phase,
    age: u32,
    rounds_in_b: u32,
    rounds_in_c: u32,
    /// Ages reported by peers we believe are still in state B, as observed this round.  Used by
    /// the median rule below to detect when enough of our contacts have caught up with us that we
    /// can retire the rumor early instead of waiting for `rounds_in_b` to hit `max_rounds_in_b`.
    peers_in_state_b: BTreeMap<PeerId, u32>,
}

impl RumorStateMachine {
    /// Constructs a freshly-injected rumor: phase `New`, age `0`.
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            phase: Phase::New,
            age: 0,
            rounds_in_b: 0,
            rounds_in_c: 0,
            peers_in_state_b: BTreeMap::new(),
        }
    }

    /// Constructs a rumor we're hearing about for the first time from `from_peer`, who reports
    /// `their_age`.  Skips `New` and enters `B` (or `C`, if the peer is already past `B`) directly
    /// with `age` set to `their_age`.
    pub fn new_from_peer(config: NetworkConfig, from_peer: PeerId, their_age: u32) -> Self {
        if their_age < config.max_rounds_in_b() {
            let mut peers_in_state_b = BTreeMap::new();
            let _ = peers_in_state_b.insert(from_peer, their_age);
            Self {
                config,
                phase: Phase::B,
                age: their_age,
                rounds_in_b: 0,
                rounds_in_c: 0,
                peers_in_state_b,
            }
        } else {
            Self {
                config,
                phase: Phase::C,
                age: their_age,
                rounds_in_b: 0,
                rounds_in_c: 0,
                peers_in_state_b: BTreeMap::new(),
            }
        }
    }

    /// Records that `from_peer` also holds this rumor, reporting `their_age`.  Called while in
    /// state B or C.  `from_peer` is added to the witness set if `their_age` indicates the peer is
    /// still in state B.  If instead `their_age` shows the peer has already reached state C, we
    /// transition straight to C ourselves rather than waiting for our own `rounds_in_b` to hit the
    /// cap: if a peer has clearly moved on, the median rule's conclusion is foregone.  Never
    /// changes `age`: the local round counter is owned by `advance_round`, not by incoming
    /// messages.
    pub fn rumor_received(&mut self, from_peer: PeerId, their_age: u32) {
        if their_age < self.config.max_rounds_in_b() {
            let _ = self.peers_in_state_b.insert(from_peer, their_age);
        } else if self.phase == Phase::B {
            self.phase = Phase::C;
            self.rounds_in_c = 0;
            self.peers_in_state_b.clear();
        }
    }

    /// Advances this rumor by one round.  Transitions cascade: if both the B and C caps are
    /// reached in the same call, the phase moves `B -> C -> Old` in one step.  `age` always
    /// increments, even for a rumor already `Old`.
    pub fn advance_round(&mut self) {
        if self.phase == Phase::New {
            self.phase = Phase::B;
        }
        if self.phase == Phase::B {
            self.rounds_in_b += 1;
            if self.rounds_in_b >= self.config.max_rounds_in_b() || self.enough_peers_informed() {
                self.phase = Phase::C;
            }
            self.peers_in_state_b.clear();
        }
        if self.phase == Phase::C {
            self.rounds_in_c += 1;
            if self.rounds_in_c >= self.config.max_rounds_in_c() {
                self.phase = Phase::Old;
            }
        }
        self.age += 1;
    }

    /// The median rule: if more of our witnesses this round are at or beyond our own age than
    /// are behind it, we treat the rumor as having saturated its oblivious audience and retire
    /// state B early rather than waiting for `rounds_in_b` to hit `max_rounds_in_b`.
    fn enough_peers_informed(&self) -> bool {
        if self.peers_in_state_b.is_empty() {
            return false;
        }
        let (behind, caught_up) = self
            .peers_in_state_b
            .values()
            .fold((0u32, 0u32), |(behind, caught_up), &their_age| {
                if their_age < self.age {
                    (behind + 1, caught_up)
                } else {
                    (behind, caught_up + 1)
                }
            });
        caught_up > behind
    }

    /// This rumor's current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// This rumor's current age (round counter).
    pub fn age(&self) -> u32 {
        self.age
    }

    /// Whether this rumor has fully propagated and should no longer be pushed.
    pub fn is_old(&self) -> bool {
        self.phase == Phase::Old
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(max_b: u32, max_c: u32) -> NetworkConfig {
        NetworkConfig::with_thresholds(max_b, max_c, 10)
    }

    #[test]
    fn new_rumor_starts_in_new_phase_with_age_zero() {
        let sm = RumorStateMachine::new(cfg(3, 2));
        assert_eq!(sm.phase(), Phase::New);
        assert_eq!(sm.age(), 0);
    }

    #[test]
    fn peer_informed_rumor_skips_new() {
        let sm = RumorStateMachine::new_from_peer(cfg(3, 2), PeerId::from(1), 2);
        assert_eq!(sm.phase(), Phase::B);
        assert_eq!(sm.age(), 2);
    }

    #[test]
    fn peer_informed_rumor_enters_c_if_peer_already_past_b() {
        let sm = RumorStateMachine::new_from_peer(cfg(3, 2), PeerId::from(1), 5);
        assert_eq!(sm.phase(), Phase::C);
        assert_eq!(sm.age(), 5);
    }

    #[test]
    fn age_is_monotonic_non_decreasing_across_rounds() {
        let mut sm = RumorStateMachine::new(cfg(5, 5));
        let mut prev = sm.age();
        for _ in 0..10 {
            sm.advance_round();
            assert!(sm.age() >= prev);
            prev = sm.age();
        }
    }

    #[test]
    fn phase_advances_monotonically_and_terminates() {
        let mut sm = RumorStateMachine::new(cfg(2, 2));
        let mut last = sm.phase();
        for _ in 0..20 {
            sm.advance_round();
            assert!(sm.phase() >= last);
            last = sm.phase();
        }
        assert_eq!(sm.phase(), Phase::Old);
        assert!(sm.is_old());
    }

    #[test]
    fn reaching_round_cap_transitions_b_to_c() {
        let mut sm = RumorStateMachine::new(cfg(2, 5));
        sm.advance_round(); // New -> B
        sm.advance_round(); // rounds_in_b = 1
        sm.advance_round(); // rounds_in_b = 2 >= max_rounds_in_b -> C
        assert_eq!(sm.phase(), Phase::C);
    }

    #[test]
    fn reaching_c_cap_transitions_to_old() {
        let mut sm = RumorStateMachine::new(cfg(1, 1));
        sm.advance_round(); // New -> B
        sm.advance_round(); // rounds_in_b = 1 >= 1 -> C
        sm.advance_round(); // rounds_in_c = 1 >= 1 -> Old
        assert_eq!(sm.phase(), Phase::Old);
    }

    #[test]
    fn cascade_can_cross_two_thresholds_in_one_call() {
        // max_rounds_in_b = 1 so the very first B round crosses into C, and with
        // max_rounds_in_c = 1 the same call should cascade straight through to Old.
        let mut sm = RumorStateMachine::new_from_peer(cfg(1, 1), PeerId::from(1), 0);
        assert_eq!(sm.phase(), Phase::B);
        sm.advance_round();
        assert_eq!(sm.phase(), Phase::Old);
    }

    #[test]
    fn stale_peer_age_transitions_straight_to_c() {
        let mut sm = RumorStateMachine::new(cfg(3, 3));
        sm.advance_round(); // New -> B
        sm.rumor_received(PeerId::from(1), 10); // 10 >= max_rounds_in_b(3): peer already in C
        assert_eq!(sm.phase(), Phase::C);
        assert!(sm.peers_in_state_b.is_empty());
    }

    #[test]
    fn stale_peer_age_is_a_no_op_once_already_past_b() {
        let mut sm = RumorStateMachine::new(cfg(2, 2));
        sm.advance_round(); // New -> B, rounds_in_b = 1
        sm.advance_round(); // rounds_in_b = 2 >= 2 -> C, rounds_in_c = 1
        assert_eq!(sm.phase(), Phase::C);
        sm.rumor_received(PeerId::from(1), 10); // already in C: must not reset rounds_in_c to 0
        assert_eq!(sm.phase(), Phase::C);
        sm.advance_round(); // rounds_in_c = 2 >= max_rounds_in_c(2) -> Old, unless wrongly reset
        assert_eq!(sm.phase(), Phase::Old);
    }

    #[test]
    fn rumor_received_never_changes_age() {
        let mut sm = RumorStateMachine::new(cfg(5, 5));
        sm.advance_round();
        let age_before = sm.age();
        sm.rumor_received(PeerId::from(1), 999);
        assert_eq!(sm.age(), age_before);
    }
}
