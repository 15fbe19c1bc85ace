use simulta::{run, FramingPolicy, RunError, RunRequest, Verdict};

const RESET: &str = "\x1b[0m";

fn request(commands: &[&str]) -> RunRequest {
    RunRequest {
        commands: commands.iter().map(|c| c.to_string()).collect(),
        shell: Some("sh".to_string()),
        ..RunRequest::default()
    }
}

async fn run_captured(req: &RunRequest) -> (Verdict, String, String) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let verdict = run(req, &mut stdout, &mut stderr).await;
    (
        verdict,
        String::from_utf8(stdout).unwrap(),
        String::from_utf8(stderr).unwrap(),
    )
}

fn sorted_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.lines().collect();
    lines.sort_unstable();
    lines
}

#[tokio::test]
async fn single_command_writes_to_stdout() {
    let (verdict, out, err) = run_captured(&request(&["echo \"foobar\""])).await;
    assert_eq!(verdict, Verdict::Success);
    assert_eq!(out, format!("foobar{RESET}\n"));
    assert_eq!(err, "");
}

#[tokio::test]
async fn single_command_writes_to_stderr() {
    let (verdict, out, err) = run_captured(&request(&[">&2 echo \"foobar\""])).await;
    assert_eq!(verdict, Verdict::Success);
    assert_eq!(out, "");
    assert_eq!(err, format!("foobar{RESET}\n"));
}

#[tokio::test]
async fn two_commands_share_stdout() {
    let (verdict, out, err) = run_captured(&request(&["echo foobar", "echo barfoo"])).await;
    assert_eq!(verdict, Verdict::Success);
    let barfoo = format!("barfoo{RESET}");
    let foobar = format!("foobar{RESET}");
    assert_eq!(sorted_lines(&out), vec![barfoo.as_str(), foobar.as_str()]);
    assert_eq!(err, "");
}

#[tokio::test]
async fn streams_do_not_cross() {
    let (verdict, out, err) = run_captured(&request(&["echo foobar", ">&2 echo barfoo"])).await;
    assert_eq!(verdict, Verdict::Success);
    assert_eq!(out, format!("foobar{RESET}\n"));
    assert_eq!(err, format!("barfoo{RESET}\n"));
}

#[tokio::test]
async fn single_failing_command_fails_without_detail() {
    let (verdict, _, _) = run_captured(&request(&["false"])).await;
    assert_eq!(verdict, Verdict::Failure { error: None });
}

#[tokio::test]
async fn one_failing_command_keeps_sibling_output() {
    let (verdict, out, err) =
        run_captured(&request(&["echo ok", "echo bad >&2; exit 7"])).await;
    assert_eq!(verdict, Verdict::Failure { error: None });
    assert_eq!(out, format!("ok{RESET}\n"));
    assert_eq!(err, format!("bad{RESET}\n"));
}

#[tokio::test]
async fn prefixes_with_index() {
    let mut req = request(&["echo foobar", ">&2 echo barfoo"]);
    req.prefix = true;
    let (verdict, out, err) = run_captured(&req).await;
    assert_eq!(verdict, Verdict::Success);
    assert_eq!(out, format!("[0] | foobar{RESET}\n"));
    assert_eq!(err, format!("[1] | barfoo{RESET}\n"));
}

#[tokio::test]
async fn prefixes_with_names_aligned_to_longest() {
    let mut req = request(&["echo foobar", ">&2 echo barfoo"]);
    req.prefix = true;
    req.names = Some(vec!["echo1".to_string(), "e2".to_string()]);
    let (verdict, out, err) = run_captured(&req).await;
    assert_eq!(verdict, Verdict::Success);
    assert_eq!(out, format!("[echo1] | foobar{RESET}\n"));
    assert_eq!(err, format!("[e2]    | barfoo{RESET}\n"));
}

#[tokio::test]
async fn index_prefixes_align_across_many_commands() {
    let commands: Vec<String> = (0..11).map(|i| format!("echo line{i}")).collect();
    let req = RunRequest {
        commands,
        prefix: true,
        shell: Some("sh".to_string()),
        ..RunRequest::default()
    };
    let (verdict, out, _) = run_captured(&req).await;
    assert_eq!(verdict, Verdict::Success);
    let lines = sorted_lines(&out);
    assert_eq!(lines.len(), 11);
    assert!(lines.contains(&format!("[0]  | line0{RESET}").as_str()));
    assert!(lines.contains(&format!("[10] | line10{RESET}").as_str()));
}

#[tokio::test]
async fn names_longer_than_commands_are_rejected() {
    let mut req = request(&["echo foobar", ">&2 echo barfoo"]);
    req.prefix = true;
    req.names = Some(vec!["echo1".into(), "echo2".into(), "echo3".into()]);
    let (verdict, out, err) = run_captured(&req).await;
    assert_eq!(
        verdict,
        Verdict::Failure {
            error: Some(RunError::NameCountMismatch {
                names: 3,
                commands: 2
            })
        }
    );
    assert_eq!(out, "");
    assert_eq!(err, "");
}

#[tokio::test]
async fn names_shorter_than_commands_are_rejected() {
    let mut req = request(&["echo foobar", ">&2 echo barfoo"]);
    req.prefix = true;
    req.names = Some(vec!["echo1".into()]);
    let (verdict, out, err) = run_captured(&req).await;
    match verdict {
        Verdict::Failure { error: Some(error) } => assert_eq!(
            error.to_string(),
            "--names options provided, but 1 names were given for 2 commands"
        ),
        other => panic!("expected validation failure, got {:?}", other),
    }
    assert_eq!(out, "");
    assert_eq!(err, "");
}

#[tokio::test]
async fn empty_command_list_is_rejected() {
    let (verdict, out, err) = run_captured(&request(&[])).await;
    match verdict {
        Verdict::Failure { error: Some(error) } => {
            assert_eq!(error.to_string(), "No command provided")
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
    assert_eq!(out, "");
    assert_eq!(err, "");
}

#[tokio::test]
async fn early_exit_does_not_stop_slower_sibling() {
    let (verdict, out, err) =
        run_captured(&request(&["sleep 1 && echo \"foobar\"", "true"])).await;
    assert_eq!(verdict, Verdict::Success);
    assert_eq!(out, format!("foobar{RESET}\n"));
    assert_eq!(err, "");
}

#[tokio::test]
async fn output_is_written_in_arrival_order() {
    // The slow command is listed first; its output must not hold back the
    // fast one.
    let (verdict, out, _) = run_captured(&request(&["sleep 1; echo slow", "echo fast"])).await;
    assert_eq!(verdict, Verdict::Success);
    assert_eq!(out, format!("fast{RESET}\nslow{RESET}\n"));
}

#[tokio::test]
async fn unterminated_output_is_flushed_as_a_line() {
    let (verdict, out, _) = run_captured(&request(&["printf 'a\\nb'"])).await;
    assert_eq!(verdict, Verdict::Success);
    assert_eq!(out, format!("a{RESET}\nb{RESET}\n"));
}

#[tokio::test]
async fn chunk_framing_groups_lines_under_one_prefix() {
    let mut req = request(&["printf 'one\\n\\ntwo\\n'"]);
    req.prefix = true;
    req.framing = FramingPolicy::Chunk;
    let (verdict, out, _) = run_captured(&req).await;
    assert_eq!(verdict, Verdict::Success);
    // A single printf is normally read in one go, but a split read may
    // produce two units; both shapes carry the same lines.
    let grouped = format!("[0] | one\n    | two{RESET}\n");
    let split = format!("[0] | one{RESET}\n[0] | two{RESET}\n");
    assert!(out == grouped || out == split, "unexpected output: {out:?}");
}

#[tokio::test]
async fn strip_ansi_removes_command_colors() {
    let mut req = request(&["printf '\\033[31mred\\033[0m\\n'"]);
    req.strip_ansi = true;
    let (verdict, out, _) = run_captured(&req).await;
    assert_eq!(verdict, Verdict::Success);
    assert_eq!(out, format!("red{RESET}\n"));
}

#[tokio::test]
async fn repeated_runs_produce_the_same_output() {
    let mut req = request(&["echo a; echo b >&2", "echo c", "exit 0"]);
    req.prefix = true;
    let first = run_captured(&req).await;
    let second = run_captured(&req).await;
    assert_eq!(first.0, second.0);
    assert_eq!(sorted_lines(&first.1), sorted_lines(&second.1));
    assert_eq!(first.2, second.2);
}

#[tokio::test]
async fn chunk_framing_drops_lines_left_empty_by_stripping() {
    let mut req = request(&["printf '\\033[2K\\nok\\n'"]);
    req.framing = FramingPolicy::Chunk;
    req.strip_ansi = true;
    let (verdict, out, _) = run_captured(&req).await;
    assert_eq!(verdict, Verdict::Success);
    assert_eq!(out, format!("ok{RESET}\n"));
}
