use clipweave_project_model::{
    AnimatedProperty, CanvasSize, ClipKind, ClipSource, IntrinsicSize, KeyframeValue,
    LoadedProject, ProjectCommand, ProjectStore, SubtitleEntry, Vec2,
};

fn temp_project_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("clipweave_it_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn edits_survive_save_and_load() {
    let dir = temp_project_dir("roundtrip");
    let loaded = LoadedProject::create(&dir, "Edit Session", CanvasSize::new(1920, 1080))
        .expect("project should be created");

    let mut store = ProjectStore::new(loaded.project.clone());
    store
        .apply(ProjectCommand::AddMediaClip {
            kind: ClipKind::Video,
            source: ClipSource::Url("https://cdn.example/intro.mp4".into()),
            name: "intro.mp4".into(),
            duration: None,
        })
        .unwrap();
    let video_id = store.project().tracks[0].clips[0].id.clone();

    // Metadata arrives asynchronously while the user adds text.
    store.enqueue(ProjectCommand::SetMediaMetadata {
        clip_id: video_id.clone(),
        intrinsic_size: Some(IntrinsicSize::new(1920.0, 1080.0)),
        duration: Some(8.0),
    });
    store
        .apply(ProjectCommand::AddTextClip {
            text: "Title".into(),
            at: 1.0,
        })
        .unwrap();
    let summary = store.drain();
    assert_eq!(summary.applied, 1);

    store
        .apply(ProjectCommand::SetKeyframe {
            clip_id: video_id.clone(),
            property: AnimatedProperty::Scale,
            time: 2.0,
            value: KeyframeValue::Vector(Vec2::new(1.5, 1.5)),
        })
        .unwrap();
    store
        .apply(ProjectCommand::SetSubtitles {
            entries: vec![SubtitleEntry::new(0.5, 2.0, "Welcome")],
        })
        .unwrap();

    assert_eq!(store.project().total_duration, 8.0);

    let saved = LoadedProject {
        root: dir.clone(),
        project: store.into_project(),
    };
    saved.save().unwrap();

    let reloaded = LoadedProject::load(&dir).unwrap();
    assert_eq!(reloaded.project, saved.project);
    assert!(reloaded.validate().is_empty(), "{:?}", reloaded.validate());

    let video = reloaded.project.find_clip(&video_id).unwrap();
    assert_eq!(video.duration, 8.0);
    assert_eq!(video.transform_at(10.0).scale, Vec2::new(1.5, 1.5));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn load_reports_parse_errors_with_path() {
    let dir = temp_project_dir("corrupt");
    std::fs::create_dir_all(dir.join("meta")).unwrap();
    std::fs::write(dir.join("meta").join("project.json"), "{ not json").unwrap();

    let err = LoadedProject::load(&dir).unwrap_err();
    assert!(err.to_string().contains("project.json"));

    std::fs::remove_dir_all(&dir).ok();
}
