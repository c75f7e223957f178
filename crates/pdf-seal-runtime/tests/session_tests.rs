use image::{ImageFormat, Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, Stream};
use pdf_seal_runtime::*;
use std::io::Cursor;
use tokio::sync::mpsc;

fn create_test_pdf(num_pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for _ in 0..num_pages {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(num_pages as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    writer
}

fn seal_png(width: u32, height: u32) -> Vec<u8> {
    let pixels = RgbaImage::from_fn(width, height, |x, y| {
        if (x + y) % 3 == 0 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([210, 30, 30, 255])
        }
    });
    let mut encoded = Cursor::new(Vec::new());
    pixels.write_to(&mut encoded, ImageFormat::Png).unwrap();
    encoded.into_inner()
}

/// Records everything a session reports
#[derive(Default)]
struct Recorder {
    statuses: Vec<StatusMessage>,
    steps: Vec<(Step, StepStatus)>,
    stages: Vec<SessionStage>,
    percents: Vec<u8>,
    pages: Vec<(usize, usize)>,
}

impl SessionObserver for Recorder {
    fn on_status(&mut self, message: &StatusMessage) {
        self.statuses.push(message.clone());
    }

    fn on_step(&mut self, step: Step, status: StepStatus) {
        self.steps.push((step, status));
    }

    fn on_stage(&mut self, stage: SessionStage) {
        self.stages.push(stage);
    }

    fn on_progress(&mut self, percent: u8) {
        self.percents.push(percent);
    }

    fn on_page_stamped(&mut self, current: usize, total: usize) {
        self.pages.push((current, total));
    }
}

async fn loaded_session(pages: usize, recorder: &mut Recorder) -> SealSession {
    let mut session = SealSession::default();
    session
        .load_seal(seal_png(300, 300), "image/png", Some("seal.png".into()), recorder)
        .await
        .unwrap();
    session
        .load_pdf(
            create_test_pdf(pages),
            "application/pdf",
            Some("contract.pdf".into()),
            recorder,
        )
        .await
        .unwrap();
    session
}

#[tokio::test]
async fn test_full_workflow() {
    let mut recorder = Recorder::default();
    let mut session = loaded_session(5, &mut recorder).await;

    // Both inputs present: slicing happens on its own
    let state = session.state();
    assert_eq!(state.slices.len(), 5);
    assert_eq!(state.stage, SessionStage::Sliced);
    assert_eq!(state.seal_name.as_deref(), Some("seal.png"));
    assert_eq!(state.step_status(Step::Seal), StepStatus::Completed);
    assert_eq!(state.step_status(Step::Pdf), StepStatus::Completed);
    assert_eq!(state.step_status(Step::Slice), StepStatus::Completed);
    assert_eq!(state.step_status(Step::Generate), StepStatus::InProgress);
    assert!(state.can_generate());

    session.generate(&mut recorder).await.unwrap();

    let state = session.state();
    assert_eq!(state.stage, SessionStage::Generated);
    assert_eq!(state.step_status(Step::Generate), StepStatus::Completed);
    let generated = state.generated.as_ref().unwrap();
    assert_eq!(generated.page_count, 5);
    assert_eq!(generated.file_name, "contract（已盖章）.pdf");
    assert_eq!(Document::load_mem(&generated.bytes).unwrap().get_pages().len(), 5);

    assert_eq!(recorder.pages, (1..=5).map(|i| (i, 5)).collect::<Vec<_>>());
    assert_eq!(recorder.percents.first(), Some(&0));
    assert_eq!(recorder.percents.last(), Some(&100));
    assert!(recorder.percents.windows(2).all(|w| w[0] <= w[1]));
    assert!(recorder.stages.contains(&SessionStage::Generating));

    let dir = tempfile::tempdir().unwrap();
    let path = session.export(dir.path(), &mut recorder).await.unwrap();
    assert_eq!(path, dir.path().join("contract（已盖章）.pdf"));
    assert_eq!(std::fs::read(&path).unwrap(), session.state().generated.as_ref().unwrap().bytes);
    assert_eq!(recorder.statuses.last().unwrap().kind, MessageKind::Success);
}

#[tokio::test]
async fn test_export_to_explicit_path() {
    let mut recorder = Recorder::default();
    let mut session = loaded_session(2, &mut recorder).await;
    session.generate(&mut recorder).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.pdf");
    let path = session.export(&target, &mut recorder).await.unwrap();
    assert_eq!(path, target);
    assert!(target.exists());
}

#[tokio::test]
async fn test_export_failure_keeps_generated_document() {
    let mut recorder = Recorder::default();
    let mut session = loaded_session(2, &mut recorder).await;
    session.generate(&mut recorder).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("missing").join("out.pdf");
    assert!(matches!(
        session.export(&target, &mut recorder).await,
        Err(SealError::Export(_))
    ));

    let state = session.state();
    assert!(state.generated.is_some());
    assert_eq!(state.step_status(Step::Generate), StepStatus::Completed);
    assert!(state.status.as_ref().unwrap().is_error());
}

#[tokio::test]
async fn test_wrong_seal_media_type_keeps_artifacts() {
    let mut recorder = Recorder::default();
    let mut session = loaded_session(3, &mut recorder).await;

    let result = session
        .load_seal(seal_png(10, 10), "image/jpeg", None, &mut recorder)
        .await;
    assert!(matches!(
        result,
        Err(SealError::UnsupportedMediaType { .. })
    ));

    let state = session.state();
    assert_eq!(state.stage, SessionStage::Error(Step::Seal));
    assert_eq!(state.step_status(Step::Seal), StepStatus::Error);
    assert!(state.seal.is_some());
    assert!(state.pdf.is_some());
    assert_eq!(state.slices.len(), 3);
    assert!(state.status.as_ref().unwrap().is_error());
}

#[tokio::test]
async fn test_undecodable_seal() {
    let mut recorder = Recorder::default();
    let mut session = SealSession::default();

    let result = session
        .load_seal(b"not a png".to_vec(), "image/png", None, &mut recorder)
        .await;
    assert!(matches!(result, Err(SealError::Decode(_))));
    assert!(session.state().seal.is_none());
    assert_eq!(session.state().stage, SessionStage::Error(Step::Seal));
}

#[tokio::test]
async fn test_corrupt_pdf_keeps_previous_document() {
    let mut recorder = Recorder::default();
    let mut session = loaded_session(4, &mut recorder).await;

    let result = session
        .load_pdf(b"garbage".to_vec(), "application/pdf", None, &mut recorder)
        .await;
    assert!(matches!(result, Err(SealError::DocumentLoad(_))));

    let state = session.state();
    assert_eq!(state.step_status(Step::Pdf), StepStatus::Error);
    assert_eq!(state.pdf.as_ref().unwrap().page_count(), 4);
    assert_eq!(state.slices.len(), 4);
}

#[tokio::test]
async fn test_new_pdf_slices_again() {
    let mut recorder = Recorder::default();
    let mut session = loaded_session(3, &mut recorder).await;
    session.generate(&mut recorder).await.unwrap();

    session
        .load_pdf(create_test_pdf(6), "application/pdf", None, &mut recorder)
        .await
        .unwrap();

    let state = session.state();
    assert_eq!(state.slices.len(), 6);
    assert!(state.generated.is_none());
    assert_eq!(state.stage, SessionStage::Sliced);

    session.generate(&mut recorder).await.unwrap();
    let generated = session.state().generated.as_ref().unwrap();
    assert_eq!(generated.page_count, 6);
    assert_eq!(generated.file_name, "带骑缝章的文档.pdf");
}

#[tokio::test]
async fn test_pdf_before_seal() {
    let mut recorder = Recorder::default();
    let mut session = SealSession::default();

    session
        .load_pdf(create_test_pdf(2), "application/pdf", None, &mut recorder)
        .await
        .unwrap();
    assert_eq!(session.state().stage, SessionStage::PdfLoaded);
    assert!(session.state().slices.is_empty());
    assert_eq!(session.state().step_status(Step::Generate), StepStatus::Pending);

    session
        .load_seal(seal_png(40, 40), "image/png", None, &mut recorder)
        .await
        .unwrap();
    assert_eq!(session.state().slices.len(), 2);
    assert_eq!(session.state().stage, SessionStage::Sliced);
}

#[tokio::test]
async fn test_operations_require_inputs() {
    let mut session = SealSession::default();

    assert!(matches!(
        session.generate(&mut ()).await,
        Err(SealError::InvalidState(_))
    ));
    assert!(matches!(
        session.slice(&mut ()).await,
        Err(SealError::InvalidState(_))
    ));
    assert!(matches!(
        session.export(std::path::Path::new("out.pdf"), &mut ()).await,
        Err(SealError::InvalidState(_))
    ));
    assert_eq!(session.state().stage, SessionStage::Idle);
}

#[tokio::test]
async fn test_changing_options_drops_generated_document() {
    let mut recorder = Recorder::default();
    let mut session = loaded_session(2, &mut recorder).await;
    session.generate(&mut recorder).await.unwrap();

    // Same options keep the result
    session
        .set_options(SealOptions::default(), &mut recorder)
        .unwrap();
    assert!(session.state().generated.is_some());

    let options = SealOptions {
        anchor: Anchor::LowerThird,
        ..Default::default()
    };
    session.set_options(options.clone(), &mut recorder).unwrap();

    let state = session.state();
    assert!(state.generated.is_none());
    assert_eq!(state.options, options);
    assert_eq!(state.stage, SessionStage::Sliced);
    assert_eq!(state.step_status(Step::Generate), StepStatus::InProgress);

    let invalid = SealOptions {
        seal_diameter_mm: 0.0,
        ..Default::default()
    };
    assert!(matches!(
        session.set_options(invalid, &mut recorder),
        Err(SealError::Config(_))
    ));
    assert_eq!(session.state().options, options);
}

#[test]
fn test_generation_percent() {
    assert_eq!(generation_percent(0, 5), 10);
    assert_eq!(generation_percent(1, 5), 20);
    assert_eq!(generation_percent(5, 5), 60);
    assert_eq!(generation_percent(1, 3), 27);
    assert_eq!(generation_percent(9, 3), 60);
    assert_eq!(generation_percent(0, 0), 10);
}

#[tokio::test]
async fn test_worker_processes_commands_in_order() {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let worker = tokio::spawn(worker_task(SealOptions::default(), command_rx, update_tx));

    let dir = tempfile::tempdir().unwrap();
    let commands = vec![
        SealCommand::LoadSeal {
            bytes: seal_png(120, 120),
            media_type: "image/png".into(),
            file_name: Some("company-seal.png".into()),
        },
        SealCommand::LoadPdf {
            bytes: create_test_pdf(3),
            media_type: "application/pdf".into(),
            file_name: Some("lease.pdf".into()),
        },
        SealCommand::Generate,
        SealCommand::Export {
            destination: dir.path().to_path_buf(),
        },
    ];
    for command in commands {
        command_tx.send(command).unwrap();
    }
    drop(command_tx);
    worker.await.unwrap();

    let mut finished = Vec::new();
    let mut seal_loaded = None;
    let mut sliced = None;
    let mut exported = None;
    while let Some(update) = update_rx.recv().await {
        match update {
            SealUpdate::Finished { command, ok } => finished.push((command, ok)),
            SealUpdate::SealLoaded {
                file_name,
                width_px,
                height_px,
            } => seal_loaded = Some((file_name, width_px, height_px)),
            SealUpdate::Sliced { slice_count } => sliced = Some(slice_count),
            SealUpdate::Exported { path } => exported = Some(path),
            _ => {}
        }
    }

    assert_eq!(
        finished,
        vec![
            ("load-seal", true),
            ("load-pdf", true),
            ("generate", true),
            ("export", true),
        ]
    );
    assert_eq!(
        seal_loaded,
        Some((Some("company-seal.png".to_string()), 120, 120))
    );
    assert_eq!(sliced, Some(3));
    let exported = exported.unwrap();
    assert_eq!(exported, dir.path().join("lease（已盖章）.pdf"));
    assert!(exported.exists());
}

#[tokio::test]
async fn test_worker_reports_errors() {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let worker = tokio::spawn(worker_task(SealOptions::default(), command_rx, update_tx));

    command_tx.send(SealCommand::Generate).unwrap();
    drop(command_tx);
    worker.await.unwrap();

    let mut saw_error = false;
    let mut finished = None;
    while let Some(update) = update_rx.recv().await {
        match update {
            SealUpdate::Error { .. } => saw_error = true,
            SealUpdate::Finished { command, ok } => finished = Some((command, ok)),
            _ => {}
        }
    }
    assert!(saw_error);
    assert_eq!(finished, Some(("generate", false)));
}
