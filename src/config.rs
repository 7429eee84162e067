// Copyright 2020 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under the MIT license <LICENSE-MIT
// http://opensource.org/licenses/MIT> or the Modified BSD license <LICENSE-BSD
// https://opensource.org/licenses/BSD-3-Clause>, at your option. This file may not be copied,
// modified, or distributed except according to those terms. Please review the Licences for the
// specific language governing permissions and limitations relating to use of the SAFE Network
// Software.

use std::cmp;

/// Epidemic round thresholds derived from the membership size.  Immutable once constructed.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    max_rounds_in_b: u32,
    max_rounds_in_c: u32,
    max_rounds_total: u32,
    network_size: usize,
}

impl NetworkConfig {
    /// Derives thresholds from `network_size` using the canonical rumor-mongering formula:
    /// `max_rounds_in_b = ceil(ln N)`, `max_rounds_in_c = ceil(ln(ln N))` (Karp et al.), each
    /// floored at `1` so a network of size 1 still terminates.
    pub fn new(network_size: usize) -> Self {
        let n = network_size as f64;
        let max_rounds_in_b = cmp::max(1, n.ln().ceil() as u32);
        let max_rounds_in_c = cmp::max(1, n.ln().ln().ceil() as u32);
        Self::with_thresholds(max_rounds_in_b, max_rounds_in_c, network_size)
    }

    /// Builds a `NetworkConfig` from explicit thresholds, bypassing the derivation formula.
    /// `max_rounds_total` is always `max_rounds_in_b + max_rounds_in_c`.
    pub fn with_thresholds(max_rounds_in_b: u32, max_rounds_in_c: u32, network_size: usize) -> Self {
        Self {
            max_rounds_in_b,
            max_rounds_in_c,
            max_rounds_total: max_rounds_in_b + max_rounds_in_c,
            network_size,
        }
    }

    /// Round threshold after which a rumor leaves state B.
    pub fn max_rounds_in_b(&self) -> u32 {
        self.max_rounds_in_b
    }

    /// Round threshold after which a rumor in state C is declared old.
    pub fn max_rounds_in_c(&self) -> u32 {
        self.max_rounds_in_c
    }

    /// Hard cap on the combined rounds spent in B and C.
    pub fn max_rounds_total(&self) -> u32 {
        self.max_rounds_total
    }

    /// The membership size this config was derived for (excluding the local node).
    pub fn network_size(&self) -> usize {
        self.network_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_positive_thresholds_even_for_tiny_networks() {
        let cfg = NetworkConfig::new(1);
        assert_eq!(cfg.max_rounds_in_b(), 1);
        assert_eq!(cfg.max_rounds_in_c(), 1);
        assert_eq!(cfg.max_rounds_total(), 2);
    }

    #[test]
    fn grows_with_network_size() {
        let small = NetworkConfig::new(10);
        let big = NetworkConfig::new(10_000);
        assert!(big.max_rounds_in_b() >= small.max_rounds_in_b());
    }

    #[test]
    fn explicit_thresholds_are_respected() {
        let cfg = NetworkConfig::with_thresholds(4, 2, 50);
        assert_eq!(cfg.max_rounds_in_b(), 4);
        assert_eq!(cfg.max_rounds_in_c(), 2);
        assert_eq!(cfg.max_rounds_total(), 6);
        assert_eq!(cfg.network_size(), 50);
    }
}
