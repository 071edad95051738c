//! Round-trip tests for the serde boundary.
//!
//! Every CRDT, its summary state, and its delta must survive
//! encode-then-decode unchanged. Map-backed internals serialize in key
//! order, so two equal CRDTs encode to semantically equal output.

#![cfg(feature = "serde")]

use std::fmt::Debug;

use deltakit::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;

fn round_trip<T>(value: &T)
where
    T: Serialize + DeserializeOwned + PartialEq + Debug,
{
    let encoded = serde_json::to_string(value).expect("encode");
    let decoded: T = serde_json::from_str(&encoded).expect("decode");
    assert_eq!(&decoded, value);
}

#[test]
fn lamport_timestamp_round_trips() {
    let ts = LamportTimestamp::new(42, "node-1".to_string());
    round_trip(&ts);
}

#[test]
fn version_vector_round_trips() {
    let mut vv = VersionVector::new();
    vv.observe("a".to_string(), 3);
    vv.observe("b".to_string(), 7);
    round_trip(&vv);
}

#[test]
fn gcounter_round_trips_with_state_and_delta() {
    let mut counter = GCounter::new("a".to_string());
    counter.increment();
    counter.increment_by(5);

    round_trip(&counter);
    round_trip(&counter.state());
    round_trip(&counter.delta(None).expect("non-empty delta"));
}

#[test]
fn pncounter_round_trips_with_state_and_delta() {
    let mut counter = PNCounter::new("a".to_string());
    counter.increment();
    counter.decrement();
    counter.decrement();

    round_trip(&counter);
    round_trip(&counter.state());
    round_trip(&counter.delta(None).expect("non-empty delta"));
}

#[test]
fn orset_round_trips_with_state_and_delta() {
    let mut set = ORSet::new("a".to_string());
    set.insert("x".to_string());
    set.insert("y".to_string());
    set.remove(&"x".to_string());

    round_trip(&set);
    round_trip(&set.state());
    round_trip(&set.delta(None).expect("non-empty delta"));
}

#[test]
fn ormap_round_trips_with_state_and_delta() {
    let mut map = ORMap::new("a".to_string());
    map.insert("x".to_string(), 1u32);
    map.insert("y".to_string(), 2u32);
    map.remove(&"y".to_string());

    round_trip(&map);
    round_trip(&map.state());
    round_trip(&map.delta(None).expect("non-empty delta"));
}

#[test]
fn decoded_replica_keeps_synchronizing() {
    let mut original = ORSet::new("a".to_string());
    original.insert(1u32);
    original.insert(2u32);

    // Ship the whole replica through the codec and keep using it.
    let encoded = serde_json::to_string(&original).expect("encode");
    let mut revived: ORSet<String, u32> = serde_json::from_str(&encoded).expect("decode");

    let mut peer = ORSet::new("b".to_string());
    peer.insert(3u32);

    revived.merge_delta(&peer.delta(Some(&revived.state())).unwrap()).unwrap();
    revived.insert(4u32);

    let elems: Vec<u32> = revived.iter().copied().collect();
    assert_eq!(elems, vec![1, 2, 3, 4]);
}
