// Copyright 2020 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under the MIT license <LICENSE-MIT
// http://opensource.org/licenses/MIT> or the Modified BSD license <LICENSE-BSD
// https://opensource.org/licenses/BSD-3-Clause>, at your option. This file may not be copied,
// modified, or distributed except according to those terms. Please review the Licences for the
// specific language governing permissions and limitations relating to use of the SAFE Network
// Software.

//! A convenience wire encoding for `Message`.  Actual transport, retry, authentication and
//! reliable delivery are external collaborators (see spec §1, §6); this module only fixes the
//! byte representation so a demo transport doesn't have to invent one.  No signing step: this
//! crate's protocol does not authenticate messages (a documented non-goal).

use crate::error::Error;
use crate::message::Message;

/// Encodes `message` for transmission.
pub fn encode(message: &Message) -> Result<Vec<u8>, Error> {
    Ok(bincode::serialize(message)?)
}

/// Decodes a `Message` previously produced by `encode`.
pub fn decode(bytes: &[u8]) -> Result<Message, Error> {
    Ok(bincode::deserialize(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::RumorId;
    use crate::message::MessageType;

    #[test]
    fn round_trips_a_push_message() {
        let original = Message::new(MessageType::Push, RumorId::from(42), 3);
        let bytes = encode(&original).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn round_trips_an_empty_pull_message() {
        let original = Message::empty(MessageType::EmptyPull);
        let bytes = encode(&original).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(original, decoded);
    }
}
