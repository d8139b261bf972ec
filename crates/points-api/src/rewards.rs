// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Referral-reward expansion of incoming point batches.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::{db::NewPointEvent, models::IncomingPointEvent};

/// Event type written for synthesized referral bonuses.
pub const REFERRAL_REWARD_TYPE: &str = "referral-reward";

/// Share of an event's points credited to the holder's referrer.
pub const REFERRAL_REWARD_RATE: f64 = 0.1;

/// An expanded batch: the rows as submitted, plus the bonus rows synthesized
/// for referrers. Both carry content-derived idempotency keys, so replaying
/// the same signed batch writes nothing new.
#[derive(Debug)]
pub struct ExpandedBatch {
    pub originals: Vec<NewPointEvent>,
    pub rewards: Vec<NewPointEvent>,
}

impl ExpandedBatch {
    /// Flatten into the insert order (originals first; order does not affect
    /// any query result).
    pub fn into_events(self) -> Vec<NewPointEvent> {
        let mut events = self.originals;
        events.extend(self.rewards);
        events
    }
}

fn event_key(batch_digest: &[u8; 32], index: usize, reward: bool) -> String {
    let mut hasher = Sha256::new();
    hasher.update(batch_digest);
    if reward {
        hasher.update(b"reward");
    }
    hasher.update((index as u64).to_be_bytes());
    hex::encode(hasher.finalize())
}

/// Expand a verified batch. Each incoming event whose holder has a referral
/// edge yields one extra event crediting the referrer with
/// [`REFERRAL_REWARD_RATE`] of the original points; events without a
/// referrer yield nothing extra.
///
/// `referrer_of` maps lowercased holder addresses to their referrer.
pub fn expand_batch(
    events: &[IncomingPointEvent],
    referrer_of: &HashMap<String, String>,
    batch_digest: &[u8; 32],
) -> ExpandedBatch {
    let mut originals = Vec::with_capacity(events.len());
    let mut rewards = Vec::new();

    for (index, event) in events.iter().enumerate() {
        originals.push(NewPointEvent {
            event_key: Some(event_key(batch_digest, index, false)),
            holder: event.holder.clone(),
            point: event.point,
            reward_by: event.reward_by.clone(),
            reward_type: event.reward_type.clone(),
            event_type: event.event_type.clone(),
            is_btc_claim: event.is_btc_claim,
        });

        if let Some(referrer) = referrer_of.get(&event.holder.to_lowercase()) {
            rewards.push(NewPointEvent {
                event_key: Some(event_key(batch_digest, index, true)),
                holder: referrer.clone(),
                point: event.point * REFERRAL_REWARD_RATE,
                reward_by: Some(event.holder.clone()),
                reward_type: event.event_type.clone(),
                event_type: Some(REFERRAL_REWARD_TYPE.to_string()),
                is_btc_claim: None,
            });
        }
    }

    ExpandedBatch { originals, rewards }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(holder: &str, point: f64, event_type: Option<&str>) -> IncomingPointEvent {
        IncomingPointEvent {
            holder: holder.to_string(),
            point,
            reward_by: None,
            reward_type: None,
            event_type: event_type.map(String::from),
            is_btc_claim: None,
        }
    }

    #[test]
    fn no_referrer_means_no_rewards() {
        let events = vec![event("0xaa", 10.0, Some("stake")), event("0xbb", 5.0, None)];
        let expanded = expand_batch(&events, &HashMap::new(), &[0u8; 32]);

        assert_eq!(expanded.originals.len(), 2);
        assert!(expanded.rewards.is_empty());
    }

    #[test]
    fn referred_holder_yields_one_ten_percent_reward() {
        let referrers = HashMap::from([("0xaa".to_string(), "0xcc".to_string())]);
        let events = vec![event("0xAA", 10.0, Some("x"))];
        let expanded = expand_batch(&events, &referrers, &[1u8; 32]);

        assert_eq!(expanded.rewards.len(), 1);
        let reward = &expanded.rewards[0];
        assert_eq!(reward.holder, "0xcc");
        assert_eq!(reward.point, 1.0);
        assert_eq!(reward.reward_by.as_deref(), Some("0xAA"));
        assert_eq!(reward.reward_type.as_deref(), Some("x"));
        assert_eq!(reward.event_type.as_deref(), Some(REFERRAL_REWARD_TYPE));
    }

    #[test]
    fn rewards_are_per_event_not_per_holder() {
        let referrers = HashMap::from([("0xaa".to_string(), "0xcc".to_string())]);
        let events = vec![event("0xaa", 10.0, None), event("0xaa", 5.0, None)];
        let expanded = expand_batch(&events, &referrers, &[2u8; 32]);

        assert_eq!(expanded.rewards.len(), 2);
        assert_eq!(expanded.rewards[0].point, 1.0);
        assert_eq!(expanded.rewards[1].point, 0.5);
    }

    #[test]
    fn event_keys_are_stable_and_distinct() {
        let referrers = HashMap::from([("0xaa".to_string(), "0xcc".to_string())]);
        let events = vec![event("0xaa", 10.0, None), event("0xbb", 3.0, None)];

        let first = expand_batch(&events, &referrers, &[3u8; 32]).into_events();
        let second = expand_batch(&events, &referrers, &[3u8; 32]).into_events();
        assert_eq!(first, second);

        let mut keys: Vec<_> = first.iter().map(|e| e.event_key.clone().unwrap()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 3, "original and reward keys must all differ");

        // A different batch digest yields different keys.
        let other = expand_batch(&events, &referrers, &[4u8; 32]).into_events();
        assert_ne!(first[0].event_key, other[0].event_key);
    }
}
