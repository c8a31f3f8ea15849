//! End-to-end scenario: the smallest channel id not excluded by either side
//! is selected during negotiation.

mod common;

use common::{RecordingHost, RecordingSession, TestEnv};
use saltyrtc_task::{NegotiationPayload, Task, TaskBuilder};
use saltyrtc_task_crypto::NullAead;

#[test]
fn init_selects_smallest_id_not_excluded_by_either_side() {
    let config = TaskBuilder::new().build().unwrap();
    let mut task: Task<TestEnv, RecordingSession, RecordingHost, NullAead> = Task::new(
        TestEnv,
        config,
        RecordingSession::default(),
        NullAead::new([1u8; 32]),
    );

    task.init(&NegotiationPayload {
        exclude: vec![0, 1, 2, 3, 4, 5],
        handover: true,
        max_packet_size: None,
    })
    .unwrap();

    assert_eq!(task.get_transport_link().unwrap().id, 6);
}
