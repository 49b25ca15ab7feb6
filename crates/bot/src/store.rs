//! In-memory registry of channels the bot administers, keyed by owner.
//!
//! Mirrors what the REST API knows; `/my_channels` reloads an owner's slice
//! from the API before rendering.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedChannel {
    pub channel_id: i64,
    pub title: String,
    pub username: Option<String>,
    pub subscribers_count: i32,
    pub is_published: bool,
}

#[derive(Default)]
pub struct ChannelStore {
    inner: Mutex<HashMap<u64, Vec<TrackedChannel>>>,
}

impl ChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a channel under the given owner.
    pub fn upsert(&self, owner_id: u64, channel: TrackedChannel) {
        let mut map = self.inner.lock().unwrap();
        let channels = map.entry(owner_id).or_default();
        if let Some(existing) = channels
            .iter_mut()
            .find(|c| c.channel_id == channel.channel_id)
        {
            *existing = channel;
        } else {
            channels.push(channel);
        }
    }

    /// Replace everything known for an owner (API reload).
    pub fn replace_owner(&self, owner_id: u64, channels: Vec<TrackedChannel>) {
        let mut map = self.inner.lock().unwrap();
        map.insert(owner_id, channels);
    }

    /// Remove a channel wherever it is tracked. Returns the owner it was
    /// removed from, if any.
    pub fn remove(&self, channel_id: i64) -> Option<u64> {
        let mut map = self.inner.lock().unwrap();
        for (owner, channels) in map.iter_mut() {
            if let Some(pos) = channels.iter().position(|c| c.channel_id == channel_id) {
                channels.remove(pos);
                return Some(*owner);
            }
        }
        None
    }

    pub fn channels_for(&self, owner_id: u64) -> Vec<TrackedChannel> {
        let map = self.inner.lock().unwrap();
        map.get(&owner_id).cloned().unwrap_or_default()
    }

    pub fn find(&self, owner_id: u64, channel_id: i64) -> Option<TrackedChannel> {
        let map = self.inner.lock().unwrap();
        map.get(&owner_id)?
            .iter()
            .find(|c| c.channel_id == channel_id)
            .cloned()
    }

    pub fn mark_published(&self, owner_id: u64, channel_id: i64) {
        let mut map = self.inner.lock().unwrap();
        if let Some(channel) = map
            .get_mut(&owner_id)
            .and_then(|cs| cs.iter_mut().find(|c| c.channel_id == channel_id))
        {
            channel.is_published = true;
        }
    }

    pub fn update_subscribers(&self, channel_id: i64, count: i32) {
        let mut map = self.inner.lock().unwrap();
        for channels in map.values_mut() {
            if let Some(channel) = channels.iter_mut().find(|c| c.channel_id == channel_id) {
                channel.subscribers_count = count;
            }
        }
    }

    /// Snapshot of every published channel with its owner, for the periodic
    /// refresh loop.
    pub fn published_channels(&self) -> Vec<(u64, TrackedChannel)> {
        let map = self.inner.lock().unwrap();
        map.iter()
            .flat_map(|(owner, channels)| {
                channels
                    .iter()
                    .filter(|c| c.is_published)
                    .map(|c| (*owner, c.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: i64) -> TrackedChannel {
        TrackedChannel {
            channel_id: id,
            title: format!("Channel {id}"),
            username: None,
            subscribers_count: 100,
            is_published: false,
        }
    }

    #[test]
    fn upsert_replaces_by_channel_id() {
        let store = ChannelStore::new();
        store.upsert(1, channel(-10));
        let mut updated = channel(-10);
        updated.subscribers_count = 250;
        store.upsert(1, updated);

        let channels = store.channels_for(1);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].subscribers_count, 250);
    }

    #[test]
    fn remove_returns_owner() {
        let store = ChannelStore::new();
        store.upsert(5, channel(-10));
        assert_eq!(store.remove(-10), Some(5));
        assert_eq!(store.remove(-10), None);
        assert!(store.channels_for(5).is_empty());
    }

    #[test]
    fn mark_published_and_snapshot() {
        let store = ChannelStore::new();
        store.upsert(1, channel(-10));
        store.upsert(1, channel(-20));
        store.upsert(2, channel(-30));

        store.mark_published(1, -20);
        let published = store.published_channels();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, 1);
        assert_eq!(published[0].1.channel_id, -20);
    }

    #[test]
    fn update_subscribers_across_owners() {
        let store = ChannelStore::new();
        store.upsert(1, channel(-10));
        store.update_subscribers(-10, 9000);
        assert_eq!(store.channels_for(1)[0].subscribers_count, 9000);
    }

    #[test]
    fn replace_owner_overwrites_slice() {
        let store = ChannelStore::new();
        store.upsert(1, channel(-10));
        store.replace_owner(1, vec![channel(-20), channel(-30)]);
        let ids: Vec<i64> = store
            .channels_for(1)
            .iter()
            .map(|c| c.channel_id)
            .collect();
        assert_eq!(ids, vec![-20, -30]);
    }
}
