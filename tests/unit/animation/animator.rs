use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::compositor::recording::{CompositorCall, RecordingCompositor};
use crate::foundation::core::{PoseExt, Vec3};
use crate::texture::TextureSize;

#[derive(Default)]
struct Counters {
    loads: AtomicUsize,
    unloads: AtomicUsize,
}

struct StubTexture {
    size: TextureSize,
    fail: bool,
    counters: Arc<Counters>,
}

impl TextureLoader for StubTexture {
    fn load(&mut self, _image: &[u8]) -> NotifyResult<TextureSize> {
        self.counters.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(NotifyError::texture("stub refuses"));
        }
        Ok(self.size)
    }

    fn unload(&mut self) {
        self.counters.unloads.fetch_add(1, Ordering::SeqCst);
    }
}

struct Rig {
    recorder: RecordingCompositor,
    counters: Arc<Counters>,
    animator: Animator,
}

fn rig_with(fail: bool) -> Rig {
    let recorder = RecordingCompositor::new();
    let overlay = recorder
        .create_overlay("test.overlay", "test", &Pose::IDENTITY, 1.0)
        .unwrap();
    recorder.take_calls();
    let counters = Arc::new(Counters::default());
    let texture = StubTexture {
        size: TextureSize {
            width: 200,
            height: 100,
        },
        fail,
        counters: counters.clone(),
    };
    let compositor: Arc<dyn Compositor> = Arc::new(recorder.clone());
    Rig {
        animator: Animator::new(compositor, overlay, Box::new(texture)),
        recorder,
        counters,
    }
}

fn rig() -> Rig {
    rig_with(false)
}

fn payload(ease_in_ms: u32, stay_ms: u32, hz: u32) -> Payload {
    let mut p = Payload::default();
    p.image = vec![1, 2, 3];
    p.transition.duration = ease_in_ms;
    p.transition.distance = 0.5;
    p.transition.opacity = 0.0;
    p.properties.duration = stay_ms;
    p.properties.hz = hz;
    p
}

fn run_to_idle(animator: &mut Animator) -> Vec<FrameReport> {
    let mut reports = Vec::new();
    while let Some(report) = animator.step() {
        reports.push(report);
        assert!(reports.len() < 10_000, "cycle never completed");
    }
    reports
}

#[test]
fn fifty_hz_cycle_runs_150_frames_then_idles() {
    let mut rig = rig();
    let plan = rig
        .animator
        .begin(payload(500, 2000, 50), FrameRate::DEFAULT)
        .unwrap();
    assert_eq!(plan.total_frames(), 150);
    assert!(!rig.animator.is_idle());
    assert_eq!(rig.animator.height(), Some(0.5));
    assert_eq!(
        rig.animator.frame_period(),
        Some(Duration::from_millis(20))
    );

    let reports = run_to_idle(&mut rig.animator);
    assert_eq!(reports.len(), 150);
    for (i, r) in reports.iter().enumerate() {
        assert_eq!(r.frame as usize, i);
    }
    assert!(reports[149].completed);
    assert!(reports[..149].iter().all(|r| !r.completed));

    assert!(rig.animator.is_idle());
    assert_eq!(rig.animator.stage(), Stage::Idle);
    assert_eq!(rig.animator.frame(), 0);
    assert!(rig.animator.plan().is_none());
    assert!(rig.animator.step().is_none());
}

#[test]
fn stage_sequence_matches_plan() {
    let mut rig = rig();
    rig.animator
        .begin(payload(500, 2000, 50), FrameRate::DEFAULT)
        .unwrap();
    let reports = run_to_idle(&mut rig.animator);

    let count = |stage| reports.iter().filter(|r| r.stage == stage).count();
    assert_eq!(count(Stage::EasingIn), 25);
    assert_eq!(count(Stage::Staying), 100);
    assert_eq!(count(Stage::EasingOut), 25);

    let mut seen = reports.iter().map(|r| r.stage).collect::<Vec<_>>();
    seen.dedup();
    assert_eq!(seen, vec![Stage::EasingIn, Stage::Staying, Stage::EasingOut]);
}

#[test]
fn staying_pushes_only_on_its_first_frame() {
    let mut rig = rig();
    rig.animator
        .begin(payload(500, 2000, 50), FrameRate::DEFAULT)
        .unwrap();
    let reports = run_to_idle(&mut rig.animator);
    let staying = reports
        .iter()
        .filter(|r| r.stage == Stage::Staying)
        .collect::<Vec<_>>();
    assert!(staying[0].pushed);
    assert_eq!(staying[0].frame, 25);
    assert!(staying[1..].iter().all(|r| !r.pushed));
    assert!(
        reports
            .iter()
            .filter(|r| r.stage != Stage::Staying)
            .all(|r| r.pushed)
    );

    // 25 ease-in + 1 staying + 25 ease-out pushes of three calls each.
    let transforms = rig
        .recorder
        .calls()
        .iter()
        .filter(|c| matches!(c, CompositorCall::Transform(..)))
        .count();
    assert_eq!(transforms, 51);
}

#[test]
fn visibility_turns_on_once_after_first_push() {
    let mut rig = rig();
    rig.animator
        .begin(payload(100, 100, 50), FrameRate::DEFAULT)
        .unwrap();
    run_to_idle(&mut rig.animator);

    let calls = rig.recorder.calls();
    assert_eq!(calls[0], CompositorCall::HeadPose);
    assert!(matches!(calls[1], CompositorCall::Transform(..)));
    assert!(matches!(calls[2], CompositorCall::Alpha(..)));
    assert!(matches!(calls[3], CompositorCall::Width(..)));
    assert_eq!(
        calls[4],
        CompositorCall::Visibility(rig.animator.overlay(), true)
    );

    let shows = calls
        .iter()
        .filter(|c| matches!(c, CompositorCall::Visibility(_, true)))
        .count();
    assert_eq!(shows, 1);
    assert_eq!(
        calls.last(),
        Some(&CompositorCall::Visibility(rig.animator.overlay(), false))
    );
}

#[test]
fn easing_reaches_rest_and_returns_to_far_end() {
    let mut rig = rig();
    let mut p = payload(100, 100, 50);
    p.properties.distance = 2.0;
    rig.animator.begin(p, FrameRate::DEFAULT).unwrap();

    let first = {
        rig.animator.step();
        *rig.animator.last_frame().unwrap()
    };
    let t: Vec3 = first.transform.translation.into();
    assert!((t.z - -2.5).abs() < 1e-5);
    assert!(first.alpha.abs() < 1e-6);

    // Frames 1..=4 ease in, frame 5 is the first hold frame.
    for _ in 0..5 {
        rig.animator.step();
    }
    let rest = *rig.animator.last_frame().unwrap();
    let t: Vec3 = rest.transform.translation.into();
    assert!((t.z - -2.0).abs() < 1e-5);
    assert!((rest.alpha - 1.0).abs() < 1e-6);

    let mut last = rest;
    while let Some(report) = rig.animator.step() {
        if report.completed {
            break;
        }
        last = *rig.animator.last_frame().unwrap();
    }
    // The final ease-out frame never reports back (state resets), the one before it is 4/5 out.
    let t: Vec3 = last.transform.translation.into();
    assert!((t.z - -2.4).abs() < 1e-5);
}

#[test]
fn missing_transition2_reuses_ease_in_profile() {
    let mut rig = rig();
    let mut p = payload(100, 0, 50);
    p.transition.interpolation = 2;
    p.transition.horizontal = 1.0;
    rig.animator.begin(p, FrameRate::DEFAULT).unwrap();
    let plan = *rig.animator.plan().unwrap();
    assert_eq!(plan.ease_out_frames, plan.ease_in_frames);

    for _ in 0..8 {
        rig.animator.step();
    }
    // Ease-out frame 7 -> (7 - 5 + 1) / 5 = 0.6, quadratic -> 0.36.
    let f = *rig.animator.last_frame().unwrap();
    assert!((f.transform.translation.x - 0.36).abs() < 1e-5);
}

#[test]
fn transition2_takes_over_on_ease_out() {
    let mut rig = rig();
    let mut p = payload(100, 100, 50);
    p.transition.horizontal = 1.0;
    p.transition2 = Some(Transition {
        duration: 40,
        horizontal: -1.0,
        ..Transition::default()
    });
    rig.animator.begin(p, FrameRate::DEFAULT).unwrap();
    let plan = *rig.animator.plan().unwrap();
    assert_eq!(plan.ease_out_frames, 2);

    for _ in 0..=plan.stay_limit {
        rig.animator.step();
    }
    let f = *rig.animator.last_frame().unwrap();
    assert!((f.transform.translation.x - -0.5).abs() < 1e-5);
    assert_eq!(rig.animator.step().map(|r| r.completed), Some(true));
}

#[test]
fn headset_cycle_never_uses_head_pose() {
    let mut rig = rig();
    rig.recorder
        .set_head_pose(Pose::IDENTITY.translate(Vec3::new(3.0, 1.0, 0.0)));
    let mut p = payload(100, 100, 50);
    p.properties.headset = true;
    rig.animator.begin(p, FrameRate::DEFAULT).unwrap();
    run_to_idle(&mut rig.animator);

    for call in rig.recorder.calls() {
        if let CompositorCall::Transform(_, pose, origin) = call {
            assert_eq!(origin, Some(0));
            assert!(pose.translation.x.abs() < 1e-5);
            assert!(pose.translation.y.abs() < 1e-5);
        }
    }
}

#[test]
fn world_cycle_is_anchored_to_snapshot() {
    let mut rig = rig();
    rig.recorder
        .set_head_pose(Pose::IDENTITY.translate(Vec3::new(3.0, 1.0, 0.0)));
    rig.animator
        .begin(payload(100, 100, 50), FrameRate::DEFAULT)
        .unwrap();
    rig.animator.step();
    // Moving the head mid-cycle must not move the overlay.
    rig.recorder.set_head_pose(Pose::IDENTITY);
    run_to_idle(&mut rig.animator);

    let heads = rig
        .recorder
        .calls()
        .iter()
        .filter(|c| matches!(c, CompositorCall::HeadPose))
        .count();
    assert_eq!(heads, 1);
    for call in rig.recorder.calls() {
        if let CompositorCall::Transform(_, pose, origin) = call {
            assert_eq!(origin, None);
            assert!((pose.translation.x - 3.0).abs() < 1e-5);
        }
    }
}

#[test]
fn zero_hz_uses_default_rate() {
    let mut rig = rig();
    let plan = rig
        .animator
        .begin(payload(400, 400, 0), FrameRate::new(25).unwrap())
        .unwrap();
    assert_eq!(plan.hz, 25);
    assert_eq!(plan.ms_per_frame, 40);
    assert_eq!(run_to_idle(&mut rig.animator).len(), 30);
}

#[test]
fn texture_failure_leaves_animator_idle() {
    let mut rig = rig_with(true);
    let err = rig
        .animator
        .begin(payload(100, 100, 50), FrameRate::DEFAULT)
        .unwrap_err();
    assert!(matches!(err, NotifyError::Texture(_)));
    assert!(rig.animator.is_idle());
    assert!(rig.animator.step().is_none());
    assert!(rig.recorder.calls().is_empty());
}

#[test]
fn begin_while_active_is_rejected() {
    let mut rig = rig();
    rig.animator
        .begin(payload(100, 100, 50), FrameRate::DEFAULT)
        .unwrap();
    assert!(
        rig.animator
            .begin(payload(100, 100, 50), FrameRate::DEFAULT)
            .is_err()
    );
    assert_eq!(rig.counters.loads.load(Ordering::SeqCst), 1);
}

#[test]
fn finished_cycle_unloads_texture() {
    let mut rig = rig();
    rig.animator
        .begin(payload(100, 100, 50), FrameRate::DEFAULT)
        .unwrap();
    run_to_idle(&mut rig.animator);
    assert_eq!(rig.counters.unloads.load(Ordering::SeqCst), 1);
}

#[test]
fn release_destroys_overlay_exactly_once() {
    let Rig {
        recorder,
        counters,
        mut animator,
    } = rig();
    let overlay = animator.overlay();
    animator
        .begin(payload(100, 100, 50), FrameRate::DEFAULT)
        .unwrap();
    animator.step();
    animator.release();
    animator.release();
    assert!(animator.is_idle());
    assert!(
        animator
            .begin(payload(100, 100, 50), FrameRate::DEFAULT)
            .is_err()
    );
    drop(animator);

    let destroys = recorder
        .calls()
        .iter()
        .filter(|c| **c == CompositorCall::Destroy(overlay))
        .count();
    assert_eq!(destroys, 1);
    assert!(recorder.live_overlays().is_empty());
    assert!(counters.unloads.load(Ordering::SeqCst) >= 1);
}

#[test]
fn compositor_failures_do_not_stop_the_cycle() {
    let mut rig = rig();
    rig.animator
        .begin(payload(100, 100, 50), FrameRate::DEFAULT)
        .unwrap();
    // Destroying the handle behind the animator's back makes every call fail.
    rig.recorder
        .destroy_overlay(rig.animator.overlay())
        .unwrap();
    assert_eq!(run_to_idle(&mut rig.animator).len(), 15);
}

#[test]
fn zero_length_cycle_shows_one_far_frame_then_hides() {
    let mut rig = rig();
    let plan = rig
        .animator
        .begin(payload(0, 0, 50), FrameRate::DEFAULT)
        .unwrap();
    assert_eq!(plan.total_frames(), 0);

    let reports = run_to_idle(&mut rig.animator);
    assert_eq!(
        reports,
        vec![FrameReport {
            frame: 0,
            stage: Stage::EasingOut,
            pushed: true,
            completed: true,
        }]
    );

    let overlay = rig.animator.overlay();
    let calls = rig.recorder.calls();
    assert_eq!(calls.len(), 6);
    assert_eq!(calls[0], CompositorCall::HeadPose);
    assert!(matches!(calls[1], CompositorCall::Transform(..)));
    // Reverse ratio 1: the frame sits at the far end, fully transparent.
    assert_eq!(calls[2], CompositorCall::Alpha(overlay, 0.0));
    assert!(matches!(calls[3], CompositorCall::Width(..)));
    assert_eq!(calls[4], CompositorCall::Visibility(overlay, true));
    assert_eq!(calls[5], CompositorCall::Visibility(overlay, false));
    assert!(rig.animator.is_idle());
}

#[test]
fn zero_ease_in_starts_at_rest_on_first_hold_frame() {
    let mut rig = rig();
    let mut p = payload(0, 100, 50);
    p.transition2 = Some(Transition {
        duration: 100,
        ..Transition::default()
    });
    rig.animator.begin(p, FrameRate::DEFAULT).unwrap();

    let first = rig.animator.step().unwrap();
    assert_eq!(first.stage, Stage::Staying);
    assert!(first.pushed);

    let overlay = rig.animator.overlay();
    let calls = rig.recorder.take_calls();
    assert_eq!(calls.len(), 5);
    assert_eq!(calls[0], CompositorCall::HeadPose);
    assert!(matches!(calls[1], CompositorCall::Transform(..)));
    assert_eq!(calls[2], CompositorCall::Alpha(overlay, 1.0));
    assert_eq!(calls[3], CompositorCall::Width(overlay, 1.0));
    assert_eq!(calls[4], CompositorCall::Visibility(overlay, true));

    // Remaining hold frames are silent, then five ease-out pushes.
    for _ in 1..5 {
        assert!(!rig.animator.step().unwrap().pushed);
    }
    assert!(rig.recorder.calls().is_empty());
    let rest = run_to_idle(&mut rig.animator);
    assert_eq!(rest.len(), 5);
    assert!(rest.iter().all(|r| r.stage == Stage::EasingOut && r.pushed));
}
