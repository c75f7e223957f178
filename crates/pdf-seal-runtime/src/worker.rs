use crate::session::{SealSession, SessionObserver, SessionStage, StatusMessage};
use crate::{SealCommand, SealUpdate};
use pdf_seal::{SealOptions, Result, Step, StepStatus};
use tokio::sync::mpsc;

/// Async worker task that owns the session, processes commands one at a
/// time in arrival order and sends updates
pub async fn worker_task(
    options: SealOptions,
    mut command_rx: mpsc::UnboundedReceiver<SealCommand>,
    update_tx: mpsc::UnboundedSender<SealUpdate>,
) {
    let mut session = SealSession::new(options);

    while let Some(cmd) = command_rx.recv().await {
        let command = cmd.name();
        log::debug!("Processing command: {}", command);

        let result = process_command(cmd, &mut session, &update_tx).await;
        if let Err(e) = &result {
            let _ = update_tx.send(SealUpdate::Error {
                message: e.to_string(),
            });
        }
        let _ = update_tx.send(SealUpdate::Finished {
            command,
            ok: result.is_ok(),
        });
    }

    log::debug!("Command channel closed, worker exiting");
}

async fn process_command(
    cmd: SealCommand,
    session: &mut SealSession,
    update_tx: &mpsc::UnboundedSender<SealUpdate>,
) -> Result<()> {
    let mut sink = UpdateSink(update_tx);

    match cmd {
        SealCommand::LoadSeal {
            bytes,
            media_type,
            file_name,
        } => {
            let result = session
                .load_seal(bytes, &media_type, file_name, &mut sink)
                .await;
            if let Some(seal) = &session.state().seal {
                if session.state().step_status(Step::Seal) == StepStatus::Completed {
                    let _ = update_tx.send(SealUpdate::SealLoaded {
                        file_name: session.state().seal_name.clone(),
                        width_px: seal.width_px(),
                        height_px: seal.height_px(),
                    });
                }
            }
            send_sliced(session, update_tx);
            result
        }
        SealCommand::LoadPdf {
            bytes,
            media_type,
            file_name,
        } => {
            let result = session
                .load_pdf(bytes, &media_type, file_name, &mut sink)
                .await;
            if let Some(pdf) = &session.state().pdf {
                if session.state().step_status(Step::Pdf) == StepStatus::Completed {
                    let _ = update_tx.send(SealUpdate::PdfLoaded {
                        page_count: pdf.page_count(),
                    });
                }
            }
            send_sliced(session, update_tx);
            result
        }
        SealCommand::SetOptions { options } => session.set_options(options, &mut sink),
        SealCommand::Slice => {
            session.slice(&mut sink).await?;
            send_sliced(session, update_tx);
            Ok(())
        }
        SealCommand::Generate => {
            session.generate(&mut sink).await?;
            if let Some(generated) = &session.state().generated {
                let _ = update_tx.send(SealUpdate::Generated {
                    file_name: generated.file_name.clone(),
                    page_count: generated.page_count,
                    byte_len: generated.bytes.len(),
                });
            }
            Ok(())
        }
        SealCommand::Export { destination } => {
            let path = session.export(&destination, &mut sink).await?;
            let _ = update_tx.send(SealUpdate::Exported { path });
            Ok(())
        }
    }
}

fn send_sliced(session: &SealSession, update_tx: &mpsc::UnboundedSender<SealUpdate>) {
    let state = session.state();
    if state.slices_fresh() && state.step_status(Step::Slice) == StepStatus::Completed {
        let _ = update_tx.send(SealUpdate::Sliced {
            slice_count: state.slices.len(),
        });
    }
}

/// Forwards session events to the update channel
struct UpdateSink<'a>(&'a mpsc::UnboundedSender<SealUpdate>);

impl SessionObserver for UpdateSink<'_> {
    fn on_status(&mut self, message: &StatusMessage) {
        let _ = self.0.send(SealUpdate::Status {
            kind: message.kind,
            message: message.text.clone(),
        });
    }

    fn on_step(&mut self, step: Step, status: StepStatus) {
        let _ = self.0.send(SealUpdate::StepChanged { step, status });
    }

    fn on_stage(&mut self, stage: SessionStage) {
        let _ = self.0.send(SealUpdate::StageChanged { stage });
    }

    fn on_progress(&mut self, percent: u8) {
        let _ = self.0.send(SealUpdate::Percent { percent });
    }

    fn on_page_stamped(&mut self, current: usize, total: usize) {
        let _ = self.0.send(SealUpdate::Progress {
            operation: "Stamping pages".to_string(),
            current,
            total,
        });
    }
}
