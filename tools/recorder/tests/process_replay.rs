use recorder::errors::RecorderError;
use recorder::process::RecordedProcessRunner;
use recorder::replay::Recorder;
use recorder::runtime::{FakeProcessRunner, ProcessOutput, ProcessRequest};
use recorder::types::RecordMode;
use std::fs::File;
use std::io::{BufWriter, Write};

// ── helpers ───────────────────────────────────────────────────────────────────

fn listing_request(pattern: &str) -> ProcessRequest {
    ProcessRequest::new("ls", ["-1", pattern])
}

fn record_listings(path: &std::path::Path, listings: &[(&str, &str)]) {
    let fake = FakeProcessRunner::default();
    for (_, stdout) in listings {
        fake.push_stdout(stdout);
    }

    let mut file = File::create(path).expect("create recording");
    {
        let mut writer = BufWriter::new(&mut file);
        let mut runner = RecordedProcessRunner::new(Recorder::recording_to(&mut writer), &fake);
        assert_eq!(runner.mode(), RecordMode::Record);
        for (pattern, stdout) in listings {
            let out = runner.run(&listing_request(pattern)).expect("record run");
            assert_eq!(out.stdout, *stdout);
        }
        drop(runner);
        writer.flush().expect("flush recording");
    }
    assert_eq!(fake.runs().len(), listings.len());
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[test]
fn recorded_listings_replay_without_running_anything() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("recording");
    record_listings(
        &path,
        &[
            ("testdata/files/*", "testdata/files/aaa\ntestdata/files/aab\ntestdata/files/aac\n"),
            ("testdata/empty/*", ""),
        ],
    );

    let text = std::fs::read_to_string(&path).expect("read recording");
    assert!(text.starts_with("ls -1 testdata/files/*\n----\ntestdata/files/aaa\n"));

    let idle = FakeProcessRunner::default();
    let file = File::open(&path).expect("open recording");
    let mut runner = RecordedProcessRunner::new(
        Recorder::replaying_from(&file, path.display().to_string()),
        &idle,
    );
    let first = runner
        .run_lines(&listing_request("testdata/files/*"))
        .expect("replay first");
    assert_eq!(
        first,
        vec![
            "testdata/files/aaa".to_string(),
            "testdata/files/aab".to_string(),
            "testdata/files/aac".to_string(),
        ]
    );
    let second = runner
        .run(&listing_request("testdata/empty/*"))
        .expect("replay second");
    assert_eq!(second.stdout, "");
    assert!(idle.runs().is_empty());

    let err = runner
        .run(&listing_request("testdata/more/*"))
        .expect_err("recording exhausted");
    assert!(matches!(err, RecorderError::NotFound { .. }));
}

#[test]
fn outputs_with_blank_lines_survive_a_file_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("recording");
    let stdout = "header\n\nbody\n----\nnot a separator\n\n";
    record_listings(&path, &[("report", stdout)]);

    let idle = FakeProcessRunner::default();
    let file = File::open(&path).expect("open recording");
    let mut runner = RecordedProcessRunner::new(Recorder::replaying_from(file, "recording"), &idle);
    let out = runner.run(&listing_request("report")).expect("replay");
    assert_eq!(out.stdout, stdout);
}

#[test]
fn replaying_after_the_code_changed_reports_drift() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("recording");
    record_listings(&path, &[("src/*.rs", "src/lib.rs\n")]);

    let idle = FakeProcessRunner::default();
    let file = File::open(&path).expect("open recording");
    let mut runner = RecordedProcessRunner::new(Recorder::replaying_from(file, "recording"), &idle);
    let err = runner
        .run(&ProcessRequest::new("ls", ["-la", "src/*.rs"]))
        .expect_err("drift");
    let message = err.to_string();
    assert!(message.contains("recording:4"), "{message}");
    assert!(message.contains("ls -1 src/*.rs"), "{message}");
    assert!(message.contains("ls -la src/*.rs"), "{message}");
}

#[test]
fn quoted_arguments_survive_record_and_replay() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("recording");
    let fake = FakeProcessRunner::default();
    fake.push_response(Ok(ProcessOutput {
        exit_code: 0,
        stdout: "match\n".to_string(),
        stderr: String::new(),
    }));
    let request = ProcessRequest::new("grep", ["-e", "two words", "notes \\ draft.txt"]);
    {
        let mut file = File::create(&path).expect("create");
        let mut runner = RecordedProcessRunner::new(Recorder::recording_to(&mut file), &fake);
        runner.run(&request).expect("record");
    }

    let idle = FakeProcessRunner::default();
    let file = File::open(&path).expect("open");
    let mut runner = RecordedProcessRunner::new(Recorder::replaying_from(file, "recording"), &idle);
    assert_eq!(runner.run(&request).expect("replay").stdout, "match\n");
}
