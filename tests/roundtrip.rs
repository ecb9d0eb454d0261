//! End-to-end encode/dispatch scenarios over the builtin packet set.

use moorgate_protocol::{
    AnyPacket, DenyPacket, FixedStr, Flags, Header, Keypair, LoginPacket, MovePacket, OkPacket,
    Packet, ProtocolError, RegisterPacket, dispatch,
};

#[test]
fn move_packet_through_dispatch() {
    let packet = MovePacket::new(0xFF, 1);
    let bytes = packet.to_bytes(None).unwrap();
    match dispatch(&bytes, None).unwrap() {
        AnyPacket::Move(decoded) => {
            assert_eq!(decoded.dy, 0xFF);
            assert_eq!(decoded.dx, 1);
        }
        other => panic!("dispatched to {}", other.name()),
    }
}

#[test]
fn every_builtin_type_round_trips() {
    fn round_trip<P>(packet: P)
    where
        P: Packet + Clone,
        AnyPacket: From<P>,
    {
        let bytes = packet.to_bytes(None).unwrap();
        assert_eq!(dispatch(&bytes, None).unwrap(), AnyPacket::from(packet));
    }

    round_trip(OkPacket::new());
    round_trip(DenyPacket::new());
    round_trip(MovePacket::new(3, 250));
    round_trip(LoginPacket::new("sylvia", "swordfish").unwrap());
    round_trip(RegisterPacket::new("brom", "tern-and-teasel").unwrap());
}

#[test]
fn encrypted_move_packet_round_trips() {
    let keypair = Keypair::generate();
    let packet = MovePacket::new(1, 0).with_flags(Flags::ENCRYPT);
    let bytes = packet.to_bytes(Some(&keypair.encrypt)).unwrap();

    // Sealed payload on the wire: nonce + two plaintext bytes + tag.
    assert_eq!(bytes.len(), Header::SIZE + 2 + 12 + 16);

    match dispatch(&bytes, Some(&keypair.decrypt)).unwrap() {
        AnyPacket::Move(decoded) => assert_eq!(decoded, packet),
        other => panic!("dispatched to {}", other.name()),
    }
}

#[test]
fn encrypted_frame_carries_the_encrypt_flag() {
    let keypair = Keypair::generate();
    let packet = LoginPacket::new("sylvia", "swordfish")
        .unwrap()
        .with_flags(Flags::ENCRYPT);
    let bytes = packet.to_bytes(Some(&keypair.encrypt)).unwrap();

    let header = Header::from_bytes(&bytes).unwrap();
    assert!(header.flags().contains(Flags::ENCRYPT));

    let decoded = dispatch(&bytes, Some(&keypair.decrypt)).unwrap();
    assert!(decoded.flags().contains(Flags::ENCRYPT));
}

#[test]
fn unknown_pid_fails_dispatch() {
    let header = Header::new(0x0BAD, Flags::empty(), 0).unwrap();
    assert!(matches!(
        dispatch(&header.to_bytes(), None),
        Err(ProtocolError::UnknownPacketType(0x0BAD))
    ));
}

#[test]
fn encrypt_without_key_fails() {
    let packet = OkPacket::new().with_flags(Flags::ENCRYPT);
    assert!(matches!(
        packet.to_bytes(None),
        Err(ProtocolError::MissingEncryptionKey)
    ));
}

#[test]
fn oversized_string_field_fails_construction() {
    assert!(matches!(
        FixedStr::new("twenty-one-characters"),
        Err(ProtocolError::StringTooLong { .. })
    ));
    assert!(LoginPacket::new("this-name-is-way-too-long", "pw").is_err());
}
