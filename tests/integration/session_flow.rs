use std::sync::Arc;

use collabx::config::CollabConfig;
use collabx::session::{
    ChannelMessage, CurrentUser, Field, IncomingNavigation, LoopbackChannel, MemoryFlagStore,
    NoticeLevel, PresenceChannel, ScopedFlagStore, SessionEvent, SessionState, REDIRECT_FLAG,
};
use collabx::tree::{FileSystemNode, TreeDelta};
use collabx::workspace::{RemoteApply, WorkspaceSession};
use collabx::{NodeId, RoomId};

fn type_in(ws: &mut WorkspaceSession, field: Field, value: &str) {
    ws.dispatch(SessionEvent::InputChanged {
        field,
        value: value.to_string(),
    });
}

#[test]
fn direct_arrival_with_room_prompts_for_username() {
    let channel = Arc::new(LoopbackChannel::new());
    let flags = Arc::new(MemoryFlagStore::new());
    let (mut ws, outcome) = WorkspaceSession::new(
        CollabConfig::default(),
        channel.clone(),
        flags,
        Some(IncomingNavigation {
            room_id: Some(RoomId::new("abcde")),
            username: None,
        }),
    );

    assert_eq!(outcome.notices.len(), 1);
    assert_eq!(outcome.notices[0].level, NoticeLevel::Info);
    assert_eq!(outcome.notices[0].message, "Enter your username");
    assert_eq!(ws.room_id().as_str(), "abcde");
    assert_eq!(ws.status(), SessionState::Disconnected);

    ws.dispatch(SessionEvent::JoinViewEntered);
    assert!(channel.connected());
    assert_eq!(ws.status(), SessionState::Disconnected);

    type_in(&mut ws, Field::Username, "grace");
    ws.dispatch(SessionEvent::Submit);
    assert_eq!(ws.status(), SessionState::AttemptingJoin);
    assert_eq!(
        channel.sent(),
        vec![ChannelMessage::JoinRequest(CurrentUser::new("grace", "abcde"))]
    );
}

#[test]
fn joined_session_survives_editor_then_resets_on_back_navigation() {
    let channel = Arc::new(LoopbackChannel::new());
    let flags = Arc::new(MemoryFlagStore::new());
    let (mut ws, _) = WorkspaceSession::new(
        CollabConfig::default(),
        channel.clone(),
        flags.clone(),
        None,
    );

    ws.dispatch(SessionEvent::JoinViewEntered);
    ws.dispatch(SessionEvent::GenerateRoomId);
    let room = ws.room_id().clone();
    type_in(&mut ws, Field::Username, "linus");

    ws.dispatch(SessionEvent::Submit);
    ws.dispatch(SessionEvent::Submit);
    assert_eq!(channel.sent().len(), 1);

    let outcome = ws.handle_message(ChannelMessage::JoinAccepted {
        user: CurrentUser::new("linus", room.as_str()),
    });
    assert_eq!(ws.status(), SessionState::Joined);
    let navigation = outcome.navigation.unwrap();
    assert_eq!(navigation.route, format!("/editor/{}", room));
    assert!(flags.is_set(REDIRECT_FLAG));

    let arrived = ws.dispatch(SessionEvent::EditorArrived);
    assert!(arrived.navigation.is_none());
    ws.dispatch(SessionEvent::ChannelStatusChanged);
    assert_eq!(ws.status(), SessionState::Joined);
    assert_eq!(channel.disconnect_count(), 0);

    // Back to the join form with the flag still set.
    let back = ws.dispatch(SessionEvent::JoinViewEntered);
    assert!(back.navigation.is_none());
    assert_eq!(ws.status(), SessionState::Disconnected);
    assert!(!flags.is_set(REDIRECT_FLAG));
    assert_eq!(channel.disconnect_count(), 1);
    assert_eq!(channel.connect_count(), 2);
}

#[test]
fn rejected_join_can_be_retried() {
    let channel = Arc::new(LoopbackChannel::connected_now());
    let (mut ws, _) = WorkspaceSession::new(
        CollabConfig::default(),
        channel.clone(),
        Arc::new(MemoryFlagStore::new()),
        None,
    );
    type_in(&mut ws, Field::Username, "ada");
    type_in(&mut ws, Field::RoomId, "room-1");
    ws.dispatch(SessionEvent::Submit);

    let outcome = ws.handle_message(ChannelMessage::JoinRejected {
        reason: "Username taken".to_string(),
    });
    assert_eq!(ws.status(), SessionState::ConnectionFailed);
    assert_eq!(outcome.notices[0].message, "Username taken");

    type_in(&mut ws, Field::Username, "ada2");
    ws.dispatch(SessionEvent::Submit);
    assert_eq!(ws.status(), SessionState::AttemptingJoin);
    assert_eq!(channel.sent().len(), 2);
}

#[test]
fn remote_stream_survives_out_of_order_deltas() {
    let channel = Arc::new(LoopbackChannel::connected_now());
    let (mut ws, _) = WorkspaceSession::new(
        CollabConfig::default(),
        channel,
        Arc::new(MemoryFlagStore::new()),
        None,
    );
    type_in(&mut ws, Field::RoomId, "room-1");
    let room = RoomId::new("room-1");

    let messages = vec![
        ChannelMessage::TreeDelta {
            room_id: room.clone(),
            delta: TreeDelta::NodeDeleted {
                id: NodeId::new("late"),
            },
        },
        ChannelMessage::TreeDelta {
            room_id: room.clone(),
            delta: TreeDelta::DirectoryCreated {
                parent_id: NodeId::root(),
                node: FileSystemNode::directory(NodeId::new("d1"), "src", Vec::new()),
            },
        },
        ChannelMessage::TreeDelta {
            room_id: room.clone(),
            delta: TreeDelta::FileCreated {
                parent_id: NodeId::new("d1"),
                node: FileSystemNode::file(NodeId::new("f1"), "main.rs", ""),
            },
        },
        ChannelMessage::TreeDelta {
            room_id: room.clone(),
            delta: TreeDelta::FileUpdated {
                id: NodeId::new("f1"),
                content: "fn main() {}".to_string(),
            },
        },
        ChannelMessage::TreeDelta {
            room_id: RoomId::new("other"),
            delta: TreeDelta::NodeDeleted {
                id: NodeId::new("d1"),
            },
        },
    ];
    for message in messages {
        let encoded = message.encode().unwrap();
        ws.handle_message(ChannelMessage::decode(&encoded).unwrap());
    }

    assert_eq!(
        ws.tree()
            .find_by_path("src/main.rs")
            .unwrap()
            .as_file()
            .unwrap()
            .content,
        "fn main() {}"
    );
    assert_eq!(
        ws.apply_remote(
            &room,
            TreeDelta::NodeMoved {
                id: NodeId::new("d1"),
                new_parent_id: NodeId::new("f1"),
            }
        ),
        RemoteApply::Absorbed(collabx::TreeError::InvalidMove {
            node: NodeId::new("d1"),
            target: NodeId::new("f1"),
        })
    );
}
