use crate::infra::{
    InMemoryHiringRepository, LoggingNotificationPublisher, TemplateQuestionGenerator,
};
use clap::Args;
use hireflow::error::AppError;
use hireflow::workflows::hiring::{
    Caller, HiringService, PositionDraft, QuestionDraft, QuestionKind, Role, TrendPeriod,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Position title used for the scripted interview
    #[arg(long, default_value = "Backend Engineer")]
    pub(crate) title: String,
    /// Number of generated questions added on top of the scripted ones
    #[arg(long, default_value_t = 2)]
    pub(crate) generated_questions: usize,
    /// Print the CSV export at the end of the demo
    #[arg(long)]
    pub(crate) export: bool,
}

/// Scripted walk through the whole workflow: a manager opens a position, two
/// candidates interview, one is scored to a decision, and the funnel
/// analytics are printed.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let manager = Caller {
        subject: "demo-manager".to_string(),
        email: "manager@example.com".to_string(),
        role: Role::Manager,
    };

    let repository = Arc::new(InMemoryHiringRepository::default());
    let notifications = Arc::new(LoggingNotificationPublisher::default());
    let service = Arc::new(HiringService::new(
        repository,
        notifications.clone(),
        Arc::new(TemplateQuestionGenerator),
    ));

    println!("Hiring workflow demo");

    let position = service.create_position(
        &manager,
        PositionDraft {
            title: args.title.clone(),
            description: Some("Demo position".to_string()),
            intro: Some("Thanks for taking the time to interview with us.".to_string()),
            farewell: Some("We will follow up with the outcome soon.".to_string()),
        },
    )?;
    println!("- Opened position {} ({})", position.id.0, position.title);

    let essay = service.add_question(
        &manager,
        &position.id,
        QuestionDraft {
            text: "Describe a production incident you handled end to end.".to_string(),
            kind: QuestionKind::Text,
            options: None,
            weight: Some(2.0),
        },
    )?;
    let choice = service.add_question(
        &manager,
        &position.id,
        QuestionDraft {
            text: "How many years of Rust experience do you have?".to_string(),
            kind: QuestionKind::MultipleChoice,
            options: Some(vec![
                "less than 1".to_string(),
                "1-3".to_string(),
                "more than 3".to_string(),
            ]),
            weight: Some(1.0),
        },
    )?;
    let generated = service.generate_questions(&manager, &position.id, args.generated_questions)?;
    println!(
        "- Added {} scripted and {} generated questions",
        2,
        generated.len()
    );

    // First candidate completes the interview and gets scored to a decision.
    let dana = Caller {
        subject: "demo-dana".to_string(),
        email: "dana@example.com".to_string(),
        role: Role::Candidate,
    };
    let application = service.start_application(&dana, &position.id, "Dana Whitfield")?;
    let mut answer_ids = vec![
        service
            .submit_answer(
                &dana,
                &application.id,
                &essay.id,
                "Paged at 2am, found a bad deploy, rolled back, wrote the postmortem.",
            )?
            .id,
        service
            .submit_answer(&dana, &application.id, &choice.id, "more than 3")?
            .id,
    ];
    for question in &generated {
        answer_ids.push(
            service
                .submit_answer(&dana, &application.id, &question.id, "A thoughtful answer.")?
                .id,
        );
    }
    service.complete_application(&dana, &application.id)?;
    println!(
        "- {} answered {} questions and completed the interview",
        application.candidate_name,
        answer_ids.len()
    );

    for answer_id in &answer_ids {
        service.score_answer(&manager, answer_id, 85.0)?;
    }
    let outcome = service.finalize_application(&manager, &application.id)?;
    println!(
        "- Finalized: {:.2}/{:.2} weighted points ({:.2}% against a {:.0}% threshold) -> {}",
        outcome.scoring.total_score,
        outcome.scoring.max_possible_score,
        outcome.scoring.score_percentage,
        outcome.scoring.threshold,
        if outcome.scoring.passed {
            "PASSED"
        } else {
            "FAILED"
        }
    );

    // Second candidate starts but never finishes, feeding the funnel reports.
    let sam = Caller {
        subject: "demo-sam".to_string(),
        email: "sam@example.com".to_string(),
        role: Role::Candidate,
    };
    service.start_application(&sam, &position.id, "Sam Porter")?;

    let status = service.analytics_status_summary(&manager)?;
    println!(
        "\nFunnel: {} applications ({} completed, {} in progress)",
        status.total, status.completed, status.in_progress
    );

    let timing = service.analytics_average_completion_time(&manager)?;
    println!(
        "Average completion time: {:.2} minutes over {} completed interviews",
        timing.average_minutes, timing.completed_applications
    );

    let distribution = service.analytics_result_distribution(&manager)?;
    println!(
        "Results: {} passed ({}%), {} failed ({}%), {} pending ({}%)",
        distribution.passed.count,
        distribution.passed.percentage,
        distribution.failed.count,
        distribution.failed.percentage,
        distribution.pending.count,
        distribution.pending.percentage
    );

    let ratios = service.analytics_completion_ratio(&manager)?;
    println!(
        "Completion ratio: {:.2} ({:.2}%)",
        ratios.overall.ratio, ratios.overall.percentage
    );

    let trend = service.analytics_trends(&manager, TrendPeriod::Daily, None)?;
    for bucket in &trend.buckets {
        println!("Started on {}: {}", bucket.date, bucket.count);
    }

    println!("\nNotifications dispatched:");
    for event in notifications.events() {
        println!(
            "- template={} recipient={} application={}",
            event.template, event.recipient, event.application_id.0
        );
    }

    if args.export {
        println!("\nCSV export:\n{}", service.export_applications_csv(&manager)?);
    }

    Ok(())
}
