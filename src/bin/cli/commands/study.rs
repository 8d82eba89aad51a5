use std::io::Stdin;

use anyhow::{Context, Result};
use chrono::Utc;

use mneme::flashcards::{
    algorithm, SessionOptions, SessionState, StudyMode, StudySession,
};

use crate::app::App;

pub fn run(app: &mut App, topic: &str, all: bool, shuffle: bool) -> Result<()> {
    let now = Utc::now();
    let options = SessionOptions {
        mode: if all { StudyMode::All } else { StudyMode::Due },
        shuffle,
    };
    let mut rng = rand::thread_rng();

    let Some(mut session) = StudySession::start(&mut app.store, topic, &options, now, &mut rng)
    else {
        if all {
            println!("No cards in '{}'.", topic);
        } else {
            println!("Nothing due in '{}'. Try --all to review ahead.", topic);
        }
        return Ok(());
    };

    println!(
        "Studying '{}': {} card(s). [Enter] reveal, s skip, q quit.",
        topic,
        session.total()
    );

    let stdin = std::io::stdin();
    'session: while session.state() != SessionState::Complete {
        let Some(card_id) = session.current_card_id() else {
            break;
        };
        let card = app
            .store
            .get(topic, card_id)
            .context("Card disappeared mid-session")?;
        let position = session.total() - session.remaining() + 1;

        println!("\n[{}/{}] {}", position, session.total(), card.question);
        match read_line(&stdin)?.trim() {
            "q" => break 'session,
            "s" => {
                session.skip();
                continue;
            }
            _ => {}
        }

        session.reveal();
        println!("---");
        println!("{}", card.answer);

        let config = app.store.config(topic);
        let [again, hard, good, easy] = algorithm::preview_intervals(&card, &config, now);
        println!(
            "(1) again {}  (2) hard {}  (4) good {}  (5) easy {}  (s)kip  (q)uit",
            algorithm::format_interval(again),
            algorithm::format_interval(hard),
            algorithm::format_interval(good),
            algorithm::format_interval(easy)
        );

        loop {
            match read_line(&stdin)?.trim() {
                "q" => break 'session,
                "s" => {
                    session.skip();
                    break;
                }
                value => match value.parse::<i32>() {
                    Ok(quality @ (1 | 2 | 4 | 5)) => {
                        session.score(&mut app.store, quality, Utc::now())?;
                        break;
                    }
                    _ => println!("Enter 1, 2, 4, 5, s or q."),
                },
            }
        }
    }

    let summary = session.end(Utc::now());
    println!(
        "\nSession over: {} card(s), {} correct, {} lapses, {}s elapsed.",
        summary.total, summary.correct, summary.lapses, summary.elapsed_seconds
    );
    Ok(())
}

fn read_line(stdin: &Stdin) -> Result<String> {
    let mut buffer = String::new();
    stdin.read_line(&mut buffer)?;
    Ok(buffer)
}
