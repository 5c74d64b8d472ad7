//! Chat protocol over both wire formats.

use proptest::prelude::*;

use roomcast::domain::protocol::{decode, encode, CodecError, Frame, WireFormat};
use roomcast::rooms::chat::{MAX_NAME_CHARS, MAX_TEXT_CHARS};
use roomcast::rooms::{ChatInbound, ChatOutbound};

fn format() -> impl Strategy<Value = WireFormat> {
    prop_oneof![Just(WireFormat::Json), Just(WireFormat::MsgPack)]
}

fn valid_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 _-]{0,30}"
}

fn inbound() -> impl Strategy<Value = ChatInbound> {
    prop_oneof![
        valid_name().prop_map(|name| ChatInbound::SetName { name }),
        "\\PC{1,200}"
            .prop_filter("needs a visible character", |t| !t.trim().is_empty())
            .prop_map(|text| ChatInbound::Chat { text }),
        Just(ChatInbound::Ping),
    ]
}

proptest! {
    #[test]
    fn valid_inbound_survives_either_format(format in format(), message in inbound()) {
        let frame = encode(format, &message).unwrap();
        prop_assert_eq!(frame.format(), format);
        prop_assert_eq!(decode::<ChatInbound>(&frame).unwrap(), message);
    }

    #[test]
    fn overlong_names_never_decode(format in format(), extra in 1usize..16) {
        let name = "n".repeat(MAX_NAME_CHARS + extra);
        let frame = match format {
            WireFormat::Json => Frame::Text(format!(r#"{{"type":"setName","name":"{name}"}}"#)),
            WireFormat::MsgPack => {
                #[derive(serde::Serialize)]
                struct Raw<'a> {
                    r#type: &'a str,
                    name: &'a str,
                }
                Frame::Binary(rmp_serde::to_vec_named(&Raw { r#type: "setName", name: &name }).unwrap())
            }
        };
        prop_assert!(matches!(decode::<ChatInbound>(&frame), Err(CodecError::Invalid(_))));
    }
}

#[test]
fn json_inbound_matches_documented_shape() {
    let frame = Frame::Text(r#"{"type":"chat","text":"hello"}"#.into());
    assert_eq!(
        decode::<ChatInbound>(&frame).unwrap(),
        ChatInbound::Chat {
            text: "hello".into()
        }
    );
}

#[test]
fn msgpack_outbound_is_a_map_with_type_tag() {
    let frame = encode(
        WireFormat::MsgPack,
        &ChatOutbound::UserLeft {
            user_id: "u1".into(),
            name: "Bob".into(),
        },
    )
    .unwrap();
    let Frame::Binary(bytes) = frame else {
        panic!("msgpack must be binary");
    };

    let value: serde_json::Value = rmp_serde::from_slice(&bytes).unwrap();
    assert_eq!(value["type"], "userLeft");
    assert_eq!(value["userId"], "u1");
    assert_eq!(value["name"], "Bob");
}

#[test]
fn text_limit_is_enforced_on_both_formats() {
    let message = ChatInbound::Chat {
        text: "x".repeat(MAX_TEXT_CHARS + 1),
    };
    for format in [WireFormat::Json, WireFormat::MsgPack] {
        assert!(matches!(encode(format, &message), Err(CodecError::Invalid(_))));
    }
}
