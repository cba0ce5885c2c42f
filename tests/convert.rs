//! End-to-end conversions against files on disk

use assert_fs::prelude::*;
use assert_fs::TempDir;
use livetalk_srt::config::{Config, LineEnding};
use livetalk_srt::error::ConvertError;
use livetalk_srt::progress::{StatusEvent, StatusSender};
use livetalk_srt::workflow::{ConversionRequest, Workflow};

const TWO_LINES: &str = "\"2024-01-01 00:00:10\",\"A\",\"Hi\",\"こんにちは\"\n\
\"2024-01-01 00:00:11\",\"B\",\"Bye\",\"バイバイ\"\n";

fn lf_config() -> Config {
    let mut config = Config::default();
    config.output.line_ending = LineEnding::Lf;
    config
}

async fn convert(
    temp: &TempDir,
    csv: &str,
    offset: i64,
) -> (Result<String, ConvertError>, Vec<StatusEvent>) {
    let input = temp.child("talk.csv");
    input.write_str(csv).unwrap();

    let workflow = Workflow::new(lf_config()).unwrap();
    let (handle, mut rx) = workflow.spawn(ConversionRequest::new(input.path(), offset));

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    let result = handle.await.unwrap().map(|summary| {
        assert_eq!(summary.destination, temp.child("talk.srt").path());
        std::fs::read_to_string(&summary.destination).unwrap()
    });
    (result, events)
}

/// Check numbering, `start <= end` within each block and no overlap between
/// blocks. Returns the `(start, end)` pairs in document order.
fn assert_ordered_blocks(srt: &str) -> Vec<(String, String)> {
    let mut times: Vec<(String, String)> = Vec::new();
    for (index, block) in srt.split("\n\n").filter(|b| !b.is_empty()).enumerate() {
        let mut lines = block.lines();
        assert_eq!(lines.next().unwrap(), (index + 1).to_string());
        let (start, end) = lines.next().unwrap().split_once(" --> ").unwrap();
        assert!(start <= end, "block {}: {start} ends at {end}", index + 1);
        if let Some((prev_start, prev_end)) = times.last() {
            assert!(prev_start.as_str() < start, "{prev_start} is not before {start}");
            assert!(prev_end.as_str() <= start, "{prev_end} overlaps {start}");
        }
        times.push((start.to_string(), end.to_string()));
    }
    times
}

#[tokio::test]
async fn test_two_record_scenario() {
    let temp = TempDir::new().unwrap();
    let (result, _) = convert(&temp, TWO_LINES, 0).await;

    assert_eq!(
        result.unwrap(),
        "1\n00:00:00,000 --> 00:00:01,000\nHi\n\n\
         2\n00:00:01,000 --> 00:00:04,000\nBye\n\n"
    );
}

#[tokio::test]
async fn test_status_events_in_order() {
    let temp = TempDir::new().unwrap();
    let (result, events) = convert(&temp, TWO_LINES, 0).await;
    assert!(result.is_ok());

    let messages: Vec<String> = events.iter().map(|e| e.to_string()).collect();
    assert_eq!(
        messages,
        vec![
            "Read CSV File : SeqNo=1",
            "Read CSV File : SeqNo=2",
            "Check lines : SeqNo=1",
            "Write SRT File : SeqNo=1",
            "Write SRT File : SeqNo=2",
            "End of file",
        ]
    );
}

#[tokio::test]
async fn test_first_subtitle_starts_at_offset() {
    let temp = TempDir::new().unwrap();
    let (result, _) = convert(&temp, TWO_LINES, 90).await;
    let srt = result.unwrap();

    assert!(srt.starts_with("1\n00:01:30,000 --> 00:01:31,000\n"));
    assert!(srt.contains("2\n00:01:31,000 --> 00:01:34,000\n"));
}

#[tokio::test]
async fn test_negative_offset_first_subtitle() {
    let temp = TempDir::new().unwrap();
    let (result, _) = convert(&temp, TWO_LINES, -5).await;
    let srt = result.unwrap();

    assert_eq!(
        srt,
        "1\n00:00:05,000 --> 00:00:06,000\nHi\n\n\
         2\n00:00:06,000 --> 00:00:09,000\nBye\n\n"
    );
    assert_eq!(assert_ordered_blocks(&srt).len(), 2);
}

#[tokio::test]
async fn test_out_of_order_timestamps_are_rejected() {
    let temp = TempDir::new().unwrap();
    let csv = "\"2024-01-01 00:00:11\",\"A\",\"Hi\",\"x\"\n\
               \"2024-01-01 00:00:10\",\"B\",\"Bye\",\"y\"\n";
    let (result, events) = convert(&temp, csv, 0).await;

    assert!(matches!(result, Err(ConvertError::Timing(_))));
    assert!(matches!(events.last(), Some(StatusEvent::Failed { .. })));
    assert!(!temp.child("talk.srt").path().exists());
}

#[tokio::test]
async fn test_sequence_and_no_overlap_for_many_records() {
    let temp = TempDir::new().unwrap();
    let mut csv = String::new();
    for i in 0..20u32 {
        let text = "word ".repeat((i % 7) as usize + 1);
        csv.push_str(&format!(
            "\"2024-01-01 10:{:02}:{:02}.{:03}\",\"S\",\"{}\",\"\"\n",
            i / 30,
            (i * 2) % 60,
            i * 37 % 1000,
            text.trim()
        ));
    }

    let (result, _) = convert(&temp, &csv, 0).await;
    let srt = result.unwrap();

    let times = assert_ordered_blocks(&srt);
    assert_eq!(times.len(), 20);
    assert!(times.iter().all(|(start, end)| start < end));
}

#[tokio::test]
async fn test_quoted_commas_survive() {
    let temp = TempDir::new().unwrap();
    let csv = "\"2024/01/01 09:00:00.500\",\"Tanaka, Ichiro\",\
               \"Yes, indeed, it is\",\"はい、そうです\"\n";
    let (result, _) = convert(&temp, csv, 0).await;

    assert_eq!(
        result.unwrap(),
        "1\n00:00:00,000 --> 00:00:04,000\nYes, indeed, it is\n\n"
    );
}

#[tokio::test]
async fn test_malformed_line_leaves_no_output() {
    let temp = TempDir::new().unwrap();
    let csv = "\"2024-01-01 00:00:10\",\"A\",\"Hi\",\"x\"\n\"2024-01-01 00:00:11\",\"B\",\"Bye\"\n";
    let (result, events) = convert(&temp, csv, 0).await;

    match result {
        Err(ConvertError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected parse error, got {other:?}"),
    }
    assert!(matches!(events.last(), Some(StatusEvent::Failed { .. })));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    assert!(!temp.child("talk.srt").path().exists());
}

#[tokio::test]
async fn test_empty_input_writes_empty_file() {
    let temp = TempDir::new().unwrap();
    let (result, events) = convert(&temp, "", 10).await;

    assert_eq!(result.unwrap(), "");
    assert_eq!(events, vec![StatusEvent::EndOfFile]);
}

#[tokio::test]
async fn test_batch_continues_past_failures() {
    let temp = TempDir::new().unwrap();
    temp.child("a.csv").write_str(TWO_LINES).unwrap();
    temp.child("nested/b.CSV").write_str(TWO_LINES).unwrap();
    temp.child("broken.csv").write_str("nonsense\n").unwrap();
    temp.child("notes.txt").write_str("ignored").unwrap();

    let workflow = Workflow::new(lf_config()).unwrap();
    let summary = workflow.convert_directory(temp.path(), 0).await.unwrap();

    assert_eq!(summary.converted.len(), 2);
    assert_eq!(summary.failed.len(), 1);
    assert!(temp.child("a.srt").path().exists());
    assert!(temp.child("nested/b.srt").path().exists());
    assert!(!temp.child("broken.srt").path().exists());
}

#[test]
fn test_blocking_conversion_with_custom_destination() {
    let temp = TempDir::new().unwrap();
    let input = temp.child("talk.csv");
    input.write_str(TWO_LINES).unwrap();
    let output = temp.child("out/subs.srt");
    std::fs::create_dir_all(temp.child("out").path()).unwrap();

    let workflow = Workflow::new(lf_config()).unwrap();
    let request = ConversionRequest::new(input.path(), 0).with_destination(output.path());
    let summary = workflow.convert_blocking(&request, &StatusSender::silent()).unwrap();

    assert_eq!(summary.entries, 2);
    let content = std::fs::read_to_string(output.path()).unwrap();
    assert!(content.starts_with("1\n00:00:00,000"));
}
