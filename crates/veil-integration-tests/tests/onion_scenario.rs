//! Integration test: onion construction and peeling without network I/O.
//!
//! Covers the protocol's end-to-end guarantees:
//! 1. A fixed three-relay scenario, peeled in path order
//! 2. Every wrong peel order fails at the first wrong relay
//! 3. Round-trip delivery through randomly selected circuits
//! 4. Circuit distinctness and failure on relay scarcity
//! 5. Layer opacity against non-path relays
//! 6. Next-hop address fidelity across the address range

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::SeedableRng;
use veil_crypto::x25519::X25519StaticSecret;
use veil_onion::layer::open_layer;
use veil_onion::{
    Circuit, CircuitSelector, Forwarder, NodeAddress, OnionEncryptor, OnionError,
    RegistrySnapshot, RelayProcessor, WrappedMessage, CIRCUIT_HOPS,
};
use veil_types::{NodeId, RelayIdentity};

/// Relays with their secrets, indexed by id.
fn make_relays(ids: &[NodeId]) -> (Vec<RelayIdentity>, HashMap<NodeId, X25519StaticSecret>) {
    let mut identities = Vec::new();
    let mut secrets = HashMap::new();
    for &id in ids {
        let secret = X25519StaticSecret::random();
        identities.push(RelayIdentity::from_key_bytes(id, secret.public_key().as_bytes()));
        secrets.insert(id, secret);
    }
    (identities, secrets)
}

/// Peel `message` with the relays in `order`, returning the final hop.
fn peel(
    secrets: &HashMap<NodeId, X25519StaticSecret>,
    order: &[NodeId],
    message: &WrappedMessage,
) -> Result<(NodeAddress, Vec<u8>), OnionError> {
    let mut current = message.clone();
    let mut next_hop = None;
    for id in order {
        let secret = secrets
            .get(id)
            .ok_or_else(|| OnionError::KeyFormat(format!("no secret for {id}")))?;
        let opened = open_layer(secret, &current)?;
        next_hop = Some(opened.next_hop);
        current = WrappedMessage::from_bytes(opened.inner);
    }
    let next_hop = next_hop.ok_or(OnionError::EmptyCircuit)?;
    Ok((next_hop, current.into_bytes()))
}

#[test]
fn concrete_three_relay_scenario() {
    // =========================================================
    // Step 1: Registry {R1, R2, R3}, circuit [R2, R1, R3]
    // =========================================================
    let (identities, secrets) = make_relays(&[1, 2, 3]);
    let by_id: HashMap<NodeId, RelayIdentity> =
        identities.iter().map(|r| (r.node_id, r.clone())).collect();
    let circuit = Circuit::new(vec![by_id[&2].clone(), by_id[&1].clone(), by_id[&3].clone()])
        .expect("circuit");

    // =========================================================
    // Step 2: Wrap "hello" for destination 0000099999
    // =========================================================
    let destination: NodeAddress = "0000099999".parse().expect("destination");
    let onion = OnionEncryptor::default()
        .wrap(b"hello", destination, &circuit)
        .expect("wrap");
    assert_eq!(onion.entry.get(), 4002, "Entry must be R2");
    assert_eq!(onion.layer_order, vec![3, 1, 2], "Layers are applied innermost first");

    // =========================================================
    // Step 3: Peel R2 -> R1 -> R3
    // =========================================================
    let hop1 = open_layer(&secrets[&2], &onion.message).expect("R2 unwraps");
    assert_eq!(hop1.next_hop.to_string(), "0000004001");

    let hop2 =
        open_layer(&secrets[&1], &WrappedMessage::from_bytes(hop1.inner)).expect("R1 unwraps");
    assert_eq!(hop2.next_hop.to_string(), "0000004003");

    let hop3 =
        open_layer(&secrets[&3], &WrappedMessage::from_bytes(hop2.inner)).expect("R3 unwraps");
    assert_eq!(hop3.next_hop.to_string(), "0000099999");
    assert_eq!(hop3.inner, b"hello");
}

#[test]
fn wrong_unwrap_order_fails() {
    let (identities, secrets) = make_relays(&[1, 2, 3]);
    let by_id: HashMap<NodeId, RelayIdentity> =
        identities.iter().map(|r| (r.node_id, r.clone())).collect();
    let circuit = Circuit::new(vec![by_id[&2].clone(), by_id[&1].clone(), by_id[&3].clone()])
        .expect("circuit");
    let onion = OnionEncryptor::default()
        .wrap(b"hello", NodeAddress::new(99_999).expect("address"), &circuit)
        .expect("wrap");

    let orders: [[NodeId; 3]; 5] = [[1, 2, 3], [1, 3, 2], [2, 3, 1], [3, 1, 2], [3, 2, 1]];
    for order in orders {
        let result = peel(&secrets, &order, &onion.message);
        assert!(
            matches!(
                result,
                Err(OnionError::Decryption(_)) | Err(OnionError::InvalidAddress(_))
            ),
            "Order {order:?} must not unwrap"
        );
    }

    let (next_hop, plaintext) = peel(&secrets, &[2, 1, 3], &onion.message).expect("path order");
    assert_eq!(next_hop.get(), 99_999);
    assert_eq!(plaintext, b"hello");
}

#[test]
fn round_trip_through_random_circuits() {
    let ids: Vec<NodeId> = (0..10).collect();
    let (identities, secrets) = make_relays(&ids);
    let snapshot = RegistrySnapshot::from_identities(identities);
    let selector = CircuitSelector::default();
    let encryptor = OnionEncryptor::default();
    let mut rng = StdRng::seed_from_u64(7);

    let plaintexts: [&[u8]; 3] = [b"", b"hello", &[0xff; 512]];
    for (i, plaintext) in plaintexts.into_iter().enumerate() {
        let circuit = selector.select_with_rng(&snapshot, &mut rng).expect("select");
        let destination = NodeAddress::new(3000 + i as u64).expect("address");
        let onion = encryptor.wrap(plaintext, destination, &circuit).expect("wrap");

        let (next_hop, recovered) =
            peel(&secrets, &circuit.node_ids(), &onion.message).expect("peel");
        assert_eq!(next_hop, destination);
        assert_eq!(recovered, plaintext);
    }
}

#[test]
fn circuits_are_distinct_and_scarcity_fails() {
    // Duplicate registrations must not produce duplicate hops.
    let (mut identities, _) = make_relays(&[1, 2, 3, 4]);
    identities.push(identities[0].clone());
    identities.push(identities[0].clone());
    let snapshot = RegistrySnapshot::from_identities(identities);
    let selector = CircuitSelector::default();

    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        let circuit = selector.select_with_rng(&snapshot, &mut rng).expect("select");
        let unique: HashSet<_> = circuit.node_ids().into_iter().collect();
        assert_eq!(unique.len(), CIRCUIT_HOPS, "Seed {seed} produced a repeated relay");
    }

    let (few, _) = make_relays(&[1, 2]);
    let result = selector.select(&RegistrySnapshot::from_identities(few));
    assert!(matches!(
        result,
        Err(OnionError::InsufficientRelays { need: 3, have: 2 })
    ));

    // Three entries but only two distinct ids.
    let (mut dup, _) = make_relays(&[1, 2]);
    dup.push(dup[1].clone());
    let result = selector.select(&RegistrySnapshot::from_identities(dup));
    assert!(matches!(
        result,
        Err(OnionError::InsufficientRelays { need: 3, have: 2 })
    ));
}

struct NeverForward;

impl Forwarder for NeverForward {
    async fn forward(&self, next_hop: NodeAddress, _payload: Vec<u8>) -> veil_onion::Result<()> {
        Err(OnionError::ForwardFailed(format!("unexpected forward to {next_hop}")))
    }
}

#[tokio::test]
async fn non_path_relay_cannot_open_layer() {
    let (identities, _) = make_relays(&[1, 2, 3]);
    let circuit = Circuit::new(identities).expect("circuit");
    let onion = OnionEncryptor::default()
        .wrap(b"secret", NodeAddress::new(3001).expect("address"), &circuit)
        .expect("wrap");

    let outsider = RelayProcessor::new(9, X25519StaticSecret::random());
    let result = outsider.process(onion.message, &NeverForward).await;
    assert!(matches!(result, Err(OnionError::Decryption(_))));
    assert!(outsider.last_message().await.decrypted.is_none());
}

#[test]
fn next_hop_address_fidelity() {
    let (identities, secrets) = make_relays(&[5]);
    let circuit = Circuit::new(identities).expect("circuit");
    let encryptor = OnionEncryptor::default();

    for value in [1u64, 9, 4002, 99_999, 1_000_000_000, 9_999_999_999] {
        let destination = NodeAddress::new(value).expect("address");
        let onion = encryptor.wrap(b"x", destination, &circuit).expect("wrap");
        let opened = open_layer(&secrets[&5], &onion.message).expect("open");
        assert_eq!(opened.next_hop.get(), value);
        assert_eq!(opened.next_hop.to_string().len(), 10);
    }
}
