use recorder::errors::RecorderError;
use recorder::replay::{parse_recording, Operation, Recorder};

fn never() -> Result<String, RecorderError> {
    panic!("replay must not run the real thing")
}

fn record_one(op: &Operation) -> String {
    let mut sink = Vec::new();
    {
        let mut rec = Recorder::recording_to(&mut sink);
        rec.record(op).expect("record");
    }
    String::from_utf8(sink).expect("utf8")
}

fn replay_all(text: &str) -> Vec<Operation> {
    let mut rec = Recorder::replaying_from(text.as_bytes(), "fuzz");
    let mut ops = Vec::new();
    while let Some(op) = rec.step().expect("step") {
        ops.push(op);
    }
    ops
}

#[test]
fn single_operation_round_trips_through_record_and_replay() {
    let data = "\ncommand\n----\noutput\n";
    let ops = replay_all(data);
    assert_eq!(ops, vec![Operation::new("command", "output\n")]);

    let mut buffer = Vec::new();
    {
        let mut rec = Recorder::recording_to(&mut buffer);
        rec.next(&ops[0].command, || Ok::<_, RecorderError>(ops[0].output.clone()))
            .expect("record");
    }
    let written = String::from_utf8(buffer).expect("utf8");
    assert_eq!(data.trim(), written.trim());
}

#[test]
fn stacked_escaped_operations_keep_their_blank_lines() {
    let data = "
command
----
output

command
----
----
output

output
----
----
";
    let ops = replay_all(data);
    assert_eq!(
        ops,
        vec![
            Operation::new("command", "output\n"),
            Operation::new("command", "output\n\noutput\n"),
        ]
    );

    for op in &ops {
        let reparsed = replay_all(&record_one(op));
        assert_eq!(reparsed, vec![op.clone()]);
    }
}

#[test]
fn two_escaped_operations_back_to_back() {
    let data = "a\n----\n----\none\n\ntwo\n----\n----\n\nb\n----\n----\nthree\n\nfour\n----\n----\n";
    let ops = replay_all(data);
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0].output, "one\n\ntwo\n");
    assert_eq!(ops[1].output, "three\n\nfour\n");
}

#[test]
fn round_trip_law_holds_for_awkward_outputs() {
    let outputs = [
        "",
        "plain\n",
        "no newline",
        "\n",
        "f\n\n",
        "f\n\n\n\n",
        "a\n\n\nb\n",
        "  indented\n\ttabbed\n",
        "a\n   \nb\n",
        "----\nafter\n",
        "before\n----\nafter\n",
        "x\n\n----\ny\n",
        "# not a comment in output\n",
        "trailing backslash \\\n",
    ];
    for output in outputs {
        let op = Operation::new("cmd --flag", output);
        let text = record_one(&op);
        let parsed = parse_recording(&text, "law").expect("parse");
        let expected_output = if output.is_empty() || output.ends_with('\n') {
            output.to_string()
        } else {
            format!("{output}\n")
        };
        assert_eq!(
            parsed,
            vec![Operation::new("cmd --flag", expected_output)],
            "output {output:?} serialized as {text:?}"
        );
        assert_eq!(parsed[0].to_recording(), text, "re-serialization of {output:?}");
    }
}

#[test]
fn outputs_ending_in_a_separator_line_are_refused() {
    let mut sink = Vec::new();
    {
        let mut rec = Recorder::recording_to(&mut sink);
        for output in ["----\n", "data\n\n----\n"] {
            let err = rec
                .record(&Operation::new("cmd", output))
                .expect_err("would close the escape block early");
            assert!(matches!(err, RecorderError::Unrepresentable(_)), "{output:?}");
        }
    }
    assert!(sink.is_empty());
}

#[test]
fn many_operations_step_in_order_then_signal_the_end() {
    let ops = (0..25)
        .map(|i| {
            let output = if i % 3 == 0 {
                format!("line {i}\n\nafter blank {i}\n")
            } else {
                format!("line {i}\n")
            };
            Operation::new(format!("step {i}"), output)
        })
        .collect::<Vec<_>>();

    let mut sink = Vec::new();
    {
        let mut rec = Recorder::recording_to(&mut sink);
        for op in &ops {
            rec.record(op).expect("record");
        }
    }

    let mut rec = Recorder::replaying_from(sink.as_slice(), "many");
    for op in &ops {
        assert_eq!(rec.step().expect("step").as_ref(), Some(op));
    }
    assert_eq!(rec.step().expect("end"), None);
    assert_eq!(rec.step().expect("still end"), None);
}

#[test]
fn command_not_followed_by_separator_is_a_grammar_error() {
    let mut rec = Recorder::replaying_from("\n0\n1\n".as_bytes(), "fuzz");
    let err = rec.step().expect_err("malformed");
    assert!(
        matches!(err, RecorderError::Grammar { ref position, .. } if position == "fuzz:3"),
        "{err}"
    );
}

#[test]
fn unterminated_escape_block_is_a_grammar_error() {
    let data = "\n0\n----\n----\n1\n\n\n1\n";
    let mut rec = Recorder::replaying_from(data.as_bytes(), "fuzz");
    assert!(matches!(rec.step(), Err(RecorderError::Grammar { .. })));
}

#[test]
fn lone_separator_in_output_is_preserved() {
    let data = "cmd\n----\n----\nbefore\n----\nafter\n\nend\n----\n----\n";
    let mut rec = Recorder::replaying_from(data.as_bytes(), "fuzz");
    let out = rec.next("cmd", never).expect("replay");
    assert_eq!(out, "before\n----\nafter\n\nend\n");
}

#[test]
fn mismatched_command_does_not_leak_the_stored_output() {
    let mut rec = Recorder::replaying_from("glob a/*\n----\nsecret\n".as_bytes(), "rec");
    let result = rec.next("glob b/*", never);
    match result {
        Err(RecorderError::Mismatch {
            recorded, requested, ..
        }) => {
            assert_eq!(recorded, "glob a/*");
            assert_eq!(requested, "glob b/*");
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
}

#[test]
fn missing_recording_entry_is_not_found() {
    let mut rec = Recorder::replaying_from("# only comments\n\n".as_bytes(), "rec");
    let err = rec.next("glob *", never).expect_err("not found");
    assert!(matches!(err, RecorderError::NotFound { .. }));
    assert!(err.to_string().contains("not found"));
}

#[test]
fn caller_error_types_pass_through_next() {
    #[derive(Debug)]
    enum AppError {
        Recorder(RecorderError),
        Glob(String),
    }

    impl From<RecorderError> for AppError {
        fn from(err: RecorderError) -> Self {
            Self::Recorder(err)
        }
    }

    let mut rec = Recorder::disabled();
    let err = rec
        .next("glob [", || Err::<String, _>(AppError::Glob("bad pattern".to_string())))
        .expect_err("glob error");
    assert!(matches!(err, AppError::Glob(ref m) if m == "bad pattern"));

    let mut replay = Recorder::replaying_from("other\n----\nx\n".as_bytes(), "rec");
    let err = replay
        .next("glob *", || -> Result<String, AppError> { unreachable!() })
        .expect_err("mismatch");
    assert!(matches!(err, AppError::Recorder(RecorderError::Mismatch { .. })));
}
