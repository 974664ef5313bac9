use step_report::model::{BuildRunResults, StepResult, StepStatus};
use step_report::output::{
    CaptureSink, Level, Line, RenderOptions, Renderer, Verdict, strip_ansi, visible_width,
};
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::datetime;

const START: OffsetDateTime = datetime!(2024-05-01 12:00:00 UTC);

fn fixed_now() -> OffsetDateTime {
    datetime!(2024-05-01 12:00:30 UTC)
}

fn renderer(sink: &CaptureSink) -> Renderer<&CaptureSink> {
    Renderer::new(
        sink,
        RenderOptions {
            color: false,
            ..RenderOptions::default()
        },
    )
    .with_clock(fixed_now)
}

fn results(success: usize, failed: usize, failed_skippable: usize, skipped: usize) -> BuildRunResults {
    let mut results = BuildRunResults::new(START);
    for i in 0..success {
        results.record(StepResult::new(format!("ok-{i}"), StepStatus::Success));
    }
    for i in 0..failed {
        results.record(StepResult::new(format!("bad-{i}"), StepStatus::Failed).with_exit_code(1));
    }
    for i in 0..failed_skippable {
        results.record(
            StepResult::new(format!("soft-{i}"), StepStatus::FailedSkippable).with_exit_code(2),
        );
    }
    for i in 0..skipped {
        results.record(StepResult::new(format!("skip-{i}"), StepStatus::Skipped));
    }
    results
}

#[test]
fn workflow_header_is_framed_by_blank_lines() {
    let sink = CaptureSink::new();
    renderer(&sink)
        .render_workflow_header("primary")
        .expect("render");

    assert_eq!(sink.texts(), vec!["", "Running workflow (primary)", ""]);
}

#[test]
fn short_step_header_is_untouched() {
    let sink = CaptureSink::new();
    renderer(&sink)
        .render_step_header("Git Clone", 1)
        .expect("render");

    let texts = sink.texts();
    assert_eq!(texts[1], "| (1) Git Clone |");
    assert_eq!(texts[0], "-".repeat(17));
    assert_eq!(texts[0], texts[2]);
}

#[test]
fn long_step_header_is_truncated_to_max_width() {
    let sink = CaptureSink::new();
    let title = "Install CocoaPods dependencies and refresh the lockfile before archiving";
    renderer(&sink).render_step_header(title, 3).expect("render");

    let texts = sink.texts();
    assert_eq!(texts[1].chars().count(), 50);
    assert!(texts[1].starts_with("| (3) Install CocoaPods"));
    assert!(texts[1].ends_with("... |"));
    assert_eq!(texts[0].chars().count(), 50);
}

#[test]
fn step_header_with_huge_index_keeps_only_ellipsis() {
    let sink = CaptureSink::new();
    Renderer::new(
        &sink,
        RenderOptions {
            max_width: 20,
            color: false,
        },
    )
    .render_step_header("abcd", 1_234_567_890_123)
    .expect("render");

    assert_eq!(sink.texts()[1], "| (1234567890123) ... |");
}

#[test]
fn success_summary_has_no_exit_code() {
    let sink = CaptureSink::new();
    renderer(&sink)
        .render_step_summary("Build", StepStatus::Success, Duration::from_millis(3_400), 0)
        .expect("render");

    assert_eq!(
        sink.texts(),
        vec![
            "-".repeat(23),
            "| ✅ | Build | 3.4 sec |".to_string(),
            "-".repeat(23),
            String::new(),
        ]
    );
}

#[test]
fn failed_summaries_report_exit_code() {
    for (status, code) in [(StepStatus::Failed, 7), (StepStatus::FailedSkippable, 2)] {
        let sink = CaptureSink::new();
        renderer(&sink)
            .render_step_summary("Unit tests", status, Duration::from_secs(12), code)
            .expect("render");

        let content = &sink.texts()[1];
        assert!(content.starts_with("| ❌ |"));
        assert!(content.contains(&format!("exit code: {code}")));
    }
}

#[test]
fn skipped_summaries_use_arrow_icon() {
    for status in [StepStatus::Skipped, StepStatus::SkippedWithRunIf] {
        let sink = CaptureSink::new();
        renderer(&sink)
            .render_step_summary("Deploy", status, Duration::from_millis(10), 5)
            .expect("render");

        assert_eq!(sink.texts()[1], "| ➡ | Deploy | 0.01 sec |");
    }
}

#[test]
fn colored_summary_fits_box_without_escape_codes() {
    let sink = CaptureSink::new();
    Renderer::new(&sink, RenderOptions::default())
        .render_step_summary(
            "Run the full integration suite against staging",
            StepStatus::Failed,
            Duration::from_secs(95),
            127,
        )
        .expect("render");

    let texts = sink.texts();
    let content = &texts[1];
    assert!(content.contains("\x1b[31m"));
    assert_eq!(visible_width(content), 50);
    assert_eq!(texts[0].chars().count(), 50);

    let plain = strip_ansi(content);
    assert!(plain.ends_with("... | 95 sec | exit code: 127 |"));
}

#[test]
fn unknown_result_code_reports_error_only() {
    let sink = CaptureSink::new();
    renderer(&sink)
        .render_step_summary_code("Mystery", 9, Duration::ZERO, 0)
        .expect("render");

    assert_eq!(sink.lines(), vec![Line::error("Unknown result code: 9")]);
}

#[test]
fn known_result_code_renders_like_status() {
    let by_code = CaptureSink::new();
    let by_status = CaptureSink::new();
    renderer(&by_code)
        .render_step_summary_code("Lint", 2, Duration::from_secs(4), 3)
        .expect("render");
    renderer(&by_status)
        .render_step_summary("Lint", StepStatus::FailedSkippable, Duration::from_secs(4), 3)
        .expect("render");

    assert_eq!(by_code.lines(), by_status.lines());
}

#[test]
fn fatal_failure_reports_error_and_run_time() {
    let sink = CaptureSink::new();
    let verdict = renderer(&sink)
        .render_fatal_failure(START, &"executor crashed")
        .expect("render");

    assert_eq!(verdict, Verdict::Terminate);
    assert_eq!(
        sink.lines(),
        vec![
            Line::error("Build failed: executor crashed"),
            Line::fatal("Total run time: 30s"),
        ]
    );
}

#[test]
fn summary_with_failures_terminates() {
    let sink = CaptureSink::new();
    let verdict = renderer(&sink)
        .render_summary(&results(3, 2, 1, 0))
        .expect("render");

    assert_eq!(verdict, Verdict::Terminate);
    assert_eq!(verdict.exit_code(), 1);

    let texts = sink.texts();
    assert!(texts.contains(&"Total run time: 30 seconds".to_string()));
    assert!(texts.contains(&"Out of 6 steps:".to_string()));
    assert!(texts.contains(&" * 3 was successful".to_string()));
    assert!(texts.contains(&" * 2 failed".to_string()));
    assert!(texts.contains(&" * 1 failed but was marked as skippable".to_string()));
    assert!(!texts.iter().any(|t| t.contains("was skipped")));

    let last = sink.lines().pop().expect("last line");
    assert_eq!(last, Line::fatal("FINISHED but a couple of steps failed - Ouch"));
}

#[test]
fn summary_with_skippable_failures_warns() {
    let sink = CaptureSink::new();
    let verdict = renderer(&sink)
        .render_summary(&results(5, 0, 1, 0))
        .expect("render");

    assert_eq!(verdict, Verdict::Continue);
    let lines = sink.lines();
    assert!(lines.contains(&Line::info("DONE - Congrats!!")));
    assert_eq!(
        lines.last(),
        Some(&Line::warn("P.S.: a couple of non important steps failed"))
    );
    assert!(lines.iter().all(|line| line.level != Level::Fatal));
}

#[test]
fn summary_of_empty_run_has_no_verdict() {
    let sink = CaptureSink::new();
    let verdict = renderer(&sink)
        .render_summary(&results(0, 0, 0, 0))
        .expect("render");

    assert_eq!(verdict, Verdict::Continue);
    assert_eq!(
        sink.texts(),
        vec!["", "==> Summary:", "Total run time: 30 seconds"]
    );
}

#[test]
fn summary_colors_bucket_lines() {
    let sink = CaptureSink::new();
    let _ = Renderer::new(&sink, RenderOptions::default())
        .with_clock(fixed_now)
        .render_summary(&results(1, 0, 0, 1))
        .expect("render");

    let texts = sink.texts();
    assert!(texts.contains(&"\x1b[32m * 1 was successful\x1b[0m".to_string()));
    assert!(texts.contains(&"\x1b[34m * 1 was skipped\x1b[0m".to_string()));
}

#[test]
fn step_status_without_problems_prints_only_counts() {
    let sink = CaptureSink::new();
    renderer(&sink)
        .render_step_status(&results(2, 0, 0, 0))
        .expect("render");

    assert_eq!(
        sink.texts(),
        vec![
            "Out of 2 steps, 2 was successful, 0 failed, 0 failed but was marked as skippable and 0 was skipped"
        ]
    );
}

#[test]
fn step_status_lists_buckets_in_order() {
    let mut run = BuildRunResults::new(START);
    run.record(StepResult::new("clone", StepStatus::Success));
    run.record(
        StepResult::new("lint", StepStatus::Failed)
            .with_error("exit status 1")
            .with_exit_code(1),
    );
    run.record(StepResult::new("test", StepStatus::Failed).with_exit_code(2));
    run.record(StepResult::new("cache", StepStatus::SkippedWithRunIf));

    let sink = CaptureSink::new();
    renderer(&sink).render_step_status(&run).expect("render");

    assert_eq!(
        sink.texts(),
        vec![
            "Out of 4 steps, 1 was successful, 2 failed, 0 failed but was marked as skippable and 1 was skipped",
            "Failed steps:",
            " * Step: (lint) | error: (exit status 1)",
            " * Step: (test)",
            "Skipped steps:",
            " * Step: (cache)",
        ]
    );
}

#[test]
fn status_list_skips_empty_error_detail() {
    let sink = CaptureSink::new();
    let steps = vec![StepResult::new("notify", StepStatus::FailedSkippable).with_error("")];
    renderer(&sink)
        .render_step_status_list("Failed but skippable steps:", &steps)
        .expect("render");

    assert_eq!(
        sink.texts(),
        vec!["Failed but skippable steps:", " * Step: (notify)"]
    );
}

#[test]
fn status_list_of_empty_bucket_emits_nothing() {
    let sink = CaptureSink::new();
    renderer(&sink)
        .render_step_status_list("Skipped steps:", &[])
        .expect("render");

    assert!(sink.lines().is_empty());
}

#[test]
fn rendering_twice_gives_identical_output() {
    let run = results(3, 1, 1, 2);
    let first = CaptureSink::new();
    let second = CaptureSink::new();

    for sink in [&first, &second] {
        let renderer = renderer(sink);
        renderer.render_workflow_header("ci").expect("render");
        renderer
            .render_step_header("Xcode Archive & Export for iOS and friends", 12)
            .expect("render");
        renderer
            .render_step_summary("Archive", StepStatus::Failed, Duration::from_secs(61), 65)
            .expect("render");
        renderer.render_step_status(&run).expect("render");
        let _ = renderer.render_summary(&run).expect("render");
    }

    assert_eq!(first.lines(), second.lines());
}

#[test]
fn step_titles_are_colored_by_status() {
    let cases = [
        (StepStatus::Success, "\x1b[32mBuild\x1b[0m"),
        (StepStatus::Failed, "\x1b[31mBuild\x1b[0m"),
        (StepStatus::FailedSkippable, "\x1b[33mBuild\x1b[0m"),
        (StepStatus::Skipped, "\x1b[34mBuild\x1b[0m"),
        (StepStatus::SkippedWithRunIf, "\x1b[34mBuild\x1b[0m"),
    ];

    for (status, painted) in cases {
        let sink = CaptureSink::new();
        Renderer::new(&sink, RenderOptions::default())
            .render_step_summary("Build", status, Duration::from_secs(2), 1)
            .expect("render");

        let content = &sink.texts()[1];
        assert!(
            content.contains(&format!("| {painted} |")),
            "{status}: {content:?}"
        );
    }
}

#[test]
fn summary_colors_failure_buckets() {
    let sink = CaptureSink::new();
    let _ = Renderer::new(&sink, RenderOptions::default())
        .with_clock(fixed_now)
        .render_summary(&results(0, 2, 1, 0))
        .expect("render");

    let texts = sink.texts();
    assert!(texts.contains(&"\x1b[31m * 2 failed\x1b[0m".to_string()));
    assert!(texts.contains(&"\x1b[33m * 1 failed but was marked as skippable\x1b[0m".to_string()));
}

#[test]
fn named_status_renders_like_enum_status() {
    let by_name = CaptureSink::new();
    let by_status = CaptureSink::new();
    renderer(&by_name)
        .render_step_summary_named("Notify", "Failed-Skippable", Duration::from_secs(1), 2)
        .expect("render");
    renderer(&by_status)
        .render_step_summary("Notify", StepStatus::FailedSkippable, Duration::from_secs(1), 2)
        .expect("render");

    assert_eq!(by_name.lines(), by_status.lines());
}

#[test]
fn named_status_accepts_result_codes() {
    let sink = CaptureSink::new();
    renderer(&sink)
        .render_step_summary_named("Mystery", "9", Duration::ZERO, 0)
        .expect("render");

    assert_eq!(sink.lines(), vec![Line::error("Unknown result code: 9")]);
}

#[test]
fn unknown_status_name_reports_error_only() {
    let sink = CaptureSink::new();
    renderer(&sink)
        .render_step_summary_named("Flaky step", "flaky", Duration::from_secs(3), 1)
        .expect("render");

    assert_eq!(sink.lines(), vec![Line::error("Unknown step status: flaky")]);
}

#[test]
fn renderer_exposes_its_options() {
    let sink = CaptureSink::new();
    let options = renderer(&sink).options();
    assert_eq!(options.max_width, 50);
    assert!(!options.color);
}
