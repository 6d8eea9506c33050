//! Running a stage between two async channels.
//!
//! Records are taken one at a time from the input channel and processed to
//! completion before the next one is read. Each output record is sent as soon
//! as it is built, so a slow consumer holds the stage back instead of letting
//! records pile up. A failing record is reported downstream as an `Err` item
//! and the stage moves on.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{BlessError, BlessStage, ChunkEngine, FileRecord};

/// Channel buffer size used by [`spawn_stage`].
pub const CHANNEL_BUFFER_SIZE: usize = 16;

/// What the stage sends downstream: an output record, or the error of the
/// record that failed.
pub type StageItem = Result<FileRecord, BlessError>;

/// Counters of a [`run_stage`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageReport {
    /// Records read from the input channel.
    pub received: usize,
    /// Records sent downstream.
    pub emitted: usize,
    /// Records that failed.
    pub failed: usize,
    /// Whether the run stopped because the downstream receiver was dropped.
    pub cancelled: bool,
}

/// Feeds every record of `input` through `stage`, sending the results to `output`.
///
/// Returns when `input` is closed and drained, or as soon as `output` is
/// closed.
pub async fn run_stage<E>(
    stage: &BlessStage<E>,
    mut input: mpsc::Receiver<FileRecord>,
    output: mpsc::Sender<StageItem>,
) -> StageReport
where
    E: ChunkEngine,
{
    let mut report = StageReport::default();

    while let Some(record) = input.recv().await {
        report.received += 1;

        match stage.process(record) {
            Ok(blessed) => {
                for file in blessed {
                    if output.send(Ok(file)).await.is_err() {
                        debug!("downstream closed, stopping");
                        report.cancelled = true;
                        return report;
                    }
                    report.emitted += 1;
                }
            }
            Err(error) => {
                warn!(%error, "record failed");
                report.failed += 1;
                if output.send(Err(error)).await.is_err() {
                    debug!("downstream closed, stopping");
                    report.cancelled = true;
                    return report;
                }
            }
        }
    }

    debug!(?report, "input closed");
    report
}

/// Channels of a stage running in its own task.
#[derive(Debug)]
pub struct StageChannels {
    /// Where to send the records to bless. Drop it to let the stage finish.
    pub input: mpsc::Sender<FileRecord>,
    /// Where the blessed records come out.
    pub output: mpsc::Receiver<StageItem>,
    /// Completes with the run counters once the stage stops.
    pub task: JoinHandle<StageReport>,
}

/// Moves `stage` into a new task fed by a channel.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_stage<E>(stage: BlessStage<E>) -> StageChannels
where
    E: ChunkEngine + Send + Sync + 'static,
{
    let (input, input_receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let (output_sender, output) = mpsc::channel(CHANNEL_BUFFER_SIZE);

    let task = tokio::spawn(async move { run_stage(&stage, input_receiver, output_sender).await });

    StageChannels {
        input,
        output,
        task,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::{ChunkResult, FixedCacheBuster, chunk_engine_fn};

    fn per_rule_stage() -> BlessStage<impl ChunkEngine + Send + Sync + 'static> {
        let engine = chunk_engine_fn(|css, _| {
            let data: Vec<String> = css.split_inclusive('}').map(str::to_string).collect();
            let total_selector_count = data.len();
            Ok(ChunkResult {
                data,
                maps: None,
                total_selector_count,
            })
        });
        BlessStage::new(engine).with_cache_buster(FixedCacheBuster(5))
    }

    fn describe(item: &StageItem) -> String {
        match item {
            Ok(record) => record.path.display().to_string(),
            Err(error) => error.to_string(),
        }
    }

    #[tokio::test]
    async fn should_forward_records_and_errors_in_order() {
        let stage = per_rule_stage();
        let (input_sender, input) = mpsc::channel(4);
        let (output, mut output_receiver) = mpsc::channel(1);

        let producer = async move {
            let records = [
                FileRecord::new("a.css", "a{}b{}"),
                FileRecord::stream("streamed.css"),
                FileRecord::new("b.css", "c{}"),
            ];
            for record in records {
                input_sender.send(record).await.expect("stage is running");
            }
        };
        let consumer = async move {
            let mut items = Vec::new();
            while let Some(item) = output_receiver.recv().await {
                items.push(describe(&item));
            }
            items
        };

        let (report, (), items) = tokio::join!(run_stage(&stage, input, output), producer, consumer);

        assert_eq!(
            items,
            vec![
                "a-blessed1.css".to_string(),
                "a.css".to_string(),
                "blesser: streaming not supported (streamed.css)".to_string(),
                "b.css".to_string(),
            ]
        );
        assert_eq!(
            report,
            StageReport {
                received: 3,
                emitted: 3,
                failed: 1,
                cancelled: false,
            }
        );
    }

    #[tokio::test]
    async fn should_stop_when_downstream_is_closed() {
        let stage = per_rule_stage();
        let (input_sender, input) = mpsc::channel(1);
        let (output, output_receiver) = mpsc::channel(1);
        drop(output_receiver);

        input_sender
            .send(FileRecord::new("a.css", "a{}b{}"))
            .await
            .expect("input open");
        drop(input_sender);

        let report = run_stage(&stage, input, output).await;

        assert!(report.cancelled);
        assert_eq!(report.received, 1);
        assert_eq!(report.emitted, 0);
    }

    #[tokio::test]
    async fn should_run_in_spawned_task() {
        let StageChannels {
            input,
            mut output,
            task,
        } = spawn_stage(per_rule_stage());

        input
            .send(FileRecord::new("css/site.css", "a{}b{}c{}"))
            .await
            .expect("stage is running");
        drop(input);

        let mut paths = Vec::new();
        while let Some(item) = output.recv().await {
            paths.push(item.expect("blessed record").path);
        }
        let report = task.await.expect("stage task completes");

        assert_eq!(
            paths,
            vec![
                PathBuf::from("css/site-blessed1.css"),
                PathBuf::from("css/site-blessed2.css"),
                PathBuf::from("css/site.css"),
            ]
        );
        assert_eq!(report.emitted, 3);
    }
}
