use clipweave_edit_geometry::{
    commit_preview_gesture, commit_timeline_gesture, GestureOutcome, PreviewGesture,
    PreviewViewport, PreviewZoomMode, TimelineGesture, TimelineZoom,
};
use clipweave_project_model::{
    compute_total_duration, CanvasSize, Clip, ClipKind, ClipSource, Project, ProjectCommand,
    ProjectStore, SubtitleEntry, Vec2, MIN_CLIP_DURATION,
};
use proptest::prelude::*;

fn image(start: f64, duration: f64) -> Clip {
    Clip::new_media(
        ClipKind::Image,
        ClipSource::Url("frame.png".into()),
        "frame.png",
        start,
        duration,
    )
}

#[test]
fn trailing_resize_to_eight_seconds_at_fifty_px_per_sec() {
    let clip = image(0.0, 5.0);
    let id = clip.id.clone();
    let mut project = Project::new("Scenario", CanvasSize::default());
    project.tracks[0].clips.push(clip);
    let mut store = ProjectStore::new(project);

    let zoom = TimelineZoom::new(50.0);
    let outcome = commit_timeline_gesture(
        store.project(),
        &id,
        TimelineGesture::ResizeTrailing { new_width_px: 400.0 },
        &zoom,
    );
    assert!(outcome.apply_to(&mut store).is_some());

    let clip = store.project().find_clip(&id).unwrap();
    assert_eq!(clip.duration, 8.0);
    assert_eq!(clip.end_time, 8.0);
    assert!(store.project().total_duration >= 8.0);
}

#[test]
fn subtitle_paired_clip_is_untouched_by_generic_gestures() {
    let mut store = ProjectStore::new(Project::new("Subs", CanvasSize::default()));
    let entry = SubtitleEntry::new(1.0, 3.0, "hello there");
    let paired = Clip::new_text(entry.text.clone(), 1.0, 2.0);
    let paired = Clip {
        id: entry.id.clone(),
        ..paired
    };
    store
        .apply(ProjectCommand::AddSubtitle { entry: entry.clone() })
        .unwrap();
    store.update(|p| {
        let mut next = p.clone();
        next.tracks[0].clips.push(paired.clone());
        next
    });
    let before = store.project().find_clip(&entry.id).unwrap().clone();
    let version = store.version();

    let zoom = TimelineZoom::default();
    for gesture in [
        TimelineGesture::Move { delta_px: 120.0 },
        TimelineGesture::ResizeLeading { delta_px: 30.0 },
        TimelineGesture::ResizeTrailing { new_width_px: 900.0 },
    ] {
        let outcome = commit_timeline_gesture(store.project(), &entry.id, gesture, &zoom);
        assert!(outcome.rejection().is_some());
        assert_eq!(outcome.apply_to(&mut store), None);
    }

    let viewport = PreviewViewport::new(1280.0, 720.0, CanvasSize::default(), PreviewZoomMode::Fit);
    let outcome = commit_preview_gesture(
        store.project(),
        &entry.id,
        PreviewGesture::Rotate { degrees: 45.0 },
        1.5,
        &viewport,
        None,
    );
    assert!(outcome.rejection().is_some());

    assert_eq!(store.version(), version);
    assert_eq!(store.project().find_clip(&entry.id).unwrap(), &before);
}

#[test]
fn gesture_commits_against_latest_project_value() {
    let a = image(0.0, 4.0);
    let a_id = a.id.clone();
    let mut project = Project::new("Race", CanvasSize::default());
    project.tracks[0].clips.push(a);
    let mut store = ProjectStore::new(project);

    // A gesture starts, then another producer adds a clip before it commits.
    let zoom = TimelineZoom::new(10.0);
    store
        .apply(ProjectCommand::AddTextClip {
            text: "Late arrival".into(),
            at: 2.0,
        })
        .unwrap();

    let outcome = commit_timeline_gesture(
        store.project(),
        &a_id,
        TimelineGesture::Move { delta_px: 50.0 },
        &zoom,
    );
    outcome.apply_to(&mut store);

    let project = store.project();
    assert_eq!(project.clips().count(), 2);
    assert_eq!(project.find_clip(&a_id).unwrap().start_time, 5.0);
    assert_eq!(project.total_duration, 9.0);
}

#[test]
fn preview_drag_on_offset_canvas() {
    let clip = image(0.0, 5.0);
    let id = clip.id.clone();
    let mut project = Project::new("Preview", CanvasSize::new(1920, 1080));
    project.tracks[0].clips.push(clip);
    let project = project.touched();

    // Canvas letterboxed inside a square container.
    let viewport = PreviewViewport::new(960.0, 960.0, project.canvas, PreviewZoomMode::Fit);
    assert_eq!(viewport.zoom, 0.5);
    assert_eq!(viewport.offset(), Vec2::new(0.0, 210.0));

    let outcome = commit_preview_gesture(
        &project,
        &id,
        PreviewGesture::Drag {
            from: Vec2::new(480.0, 480.0),
            to: Vec2::new(576.0, 534.0),
        },
        0.5,
        &viewport,
        None,
    );
    let GestureOutcome::Committed(next) = outcome else {
        panic!("drag should commit");
    };
    let position = next.find_clip(&id).unwrap().transform.position;
    assert!(position.approx_eq(&Vec2::new(0.6, 0.6), 1e-9));
}

fn gesture_strategy() -> impl Strategy<Value = TimelineGesture> {
    let px = prop_oneof![
        8 => -2_000.0f64..2_000.0,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
    ];
    (0..3u8, px).prop_map(|(kind, px)| match kind {
        0 => TimelineGesture::Move { delta_px: px },
        1 => TimelineGesture::ResizeLeading { delta_px: px },
        _ => TimelineGesture::ResizeTrailing { new_width_px: px },
    })
}

proptest! {
    #[test]
    fn prop_clip_timing_invariant_holds_under_any_gesture_sequence(
        gestures in prop::collection::vec((0..3usize, gesture_strategy()), 1..40),
        px_per_sec in 1.0f64..400.0,
    ) {
        let mut project = Project::new("Prop", CanvasSize::default());
        project.tracks[0].clips = vec![image(0.0, 2.0), image(1.0, 3.0), image(6.0, 0.5)];
        let ids: Vec<String> = project.clips().map(|c| c.id.clone()).collect();
        let mut store = ProjectStore::new(project);
        let zoom = TimelineZoom::new(px_per_sec);

        for (target, gesture) in gestures {
            commit_timeline_gesture(store.project(), &ids[target], gesture, &zoom)
                .apply_to(&mut store);

            let project = store.project();
            for clip in project.clips() {
                prop_assert!(clip.duration >= MIN_CLIP_DURATION - 1e-9);
                prop_assert!(clip.start_time >= 0.0);
                prop_assert!((clip.end_time - (clip.start_time + clip.duration)).abs() < 1e-9);
            }
            prop_assert_eq!(project.total_duration, compute_total_duration(&project.tracks));
            let starts: Vec<f64> = project.tracks[0].clips.iter().map(|c| c.start_time).collect();
            prop_assert!(starts.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
