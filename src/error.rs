// Copyright 2020 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under the MIT license <LICENSE-MIT
// http://opensource.org/licenses/MIT> or the Modified BSD license <LICENSE-BSD
// https://opensource.org/licenses/BSD-3-Clause>, at your option. This file may not be copied,
// modified, or distributed except according to those terms. Please review the Licences for the
// specific language governing permissions and limitations relating to use of the SAFE Network
// Software.

quick_error! {
    /// Errors produced by this crate.
    #[derive(Debug)]
    pub enum Error {
        /// Raised when a `RumorHolder` is constructed with an explicit `NetworkConfig` whose
        /// `network_size` doesn't match the size of the supplied membership set.
        ConfigMismatch(expected: usize, actual: usize) {
            display("NetworkConfig.network_size ({}) does not match peer count ({})", expected, actual)
        }
        /// Wraps a `bincode` (de)serialisation failure from the `wire` module.
        Bincode(err: bincode::Error) {
            from()
            display("bincode error: {}", err)
        }
    }
}
