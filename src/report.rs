use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::engine::{Clock, GameEngine, GameStatus};
use crate::prizes::{evaluate, sponsor_message, total_value, PrizeTable};

const RULE: &str = "============================================================";
const PATH_PREVIEW: usize = 10;

fn heading(text: &str, color: Color) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

fn plain(text: String) -> Line<'static> {
    Line::from(text)
}

/// "1234567" -> "1,234,567"
pub fn format_dollars(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// First rooms of the path, then an ellipsis and the last room.
pub fn path_summary(path: &[String]) -> Vec<String> {
    let mut lines = vec![format!(
        "Path Taken: {}",
        path.iter()
            .take(PATH_PREVIEW)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" → ")
    )];
    if path.len() > PATH_PREVIEW {
        if let Some(last) = path.last() {
            lines.push(format!("            → ... → {}", last));
        }
    }
    lines
}

pub fn final_stats<C: Clock>(engine: &GameEngine<C>) -> Vec<Line<'static>> {
    let player = engine.player();
    let mut lines = vec![
        heading(RULE, Color::Cyan),
        heading("FINAL STATISTICS", Color::Cyan),
        heading(RULE, Color::Cyan),
    ];

    let result = match engine.status() {
        GameStatus::Won => Span::styled(
            "VICTORY!",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        GameStatus::Aborted => Span::styled(
            "ABORTED",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        _ => Span::styled(
            "DEFEAT",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    };
    lines.push(Line::from(vec![Span::raw("Result: "), result]));
    lines.push(plain(format!(
        "Time Used: {:.1} seconds",
        player.elapsed().as_secs_f64()
    )));
    lines.push(plain(format!("Pendants Remaining: {}", player.pendants)));
    lines.push(plain(format!(
        "Temple Guards Encountered: {}",
        player.guards_encountered
    )));
    lines.push(plain(format!(
        "Rooms Explored: {}/{}",
        engine.visited().len(),
        engine.graph().len()
    )));
    lines.push(Line::default());
    lines.extend(path_summary(&player.path).into_iter().map(plain));
    lines
}

/// The announcer reads out every prize earned. Empty when nothing was won.
pub fn prize_ceremony<C: Clock>(engine: &GameEngine<C>, table: &PrizeTable) -> Vec<Line<'static>> {
    let won = engine.status() == GameStatus::Won;
    let prizes = evaluate(
        engine.player(),
        won,
        engine.visited().len(),
        engine.graph().len(),
        table,
    );
    if prizes.is_empty() {
        return Vec::new();
    }

    let mut lines = vec![
        Line::default(),
        heading(RULE, Color::Yellow),
        heading("🎁 PRIZES AWARDED! 🎁", Color::Yellow),
        heading(RULE, Color::Yellow),
        Line::default(),
        heading("[KIRK]: Tell them what they've won!", Color::Cyan),
        Line::default(),
        heading("[ANNOUNCER]:", Color::Green),
    ];

    for prize in &prizes {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("★ {}", prize.name.to_uppercase()),
            Style::default().fg(Color::Yellow),
        )));
        lines.push(plain(format!("  {}", prize.description)));
        lines.push(Line::from(Span::styled(
            format!("  Provided by: {}", prize.sponsor),
            Style::default().fg(Color::Cyan),
        )));
        if !prize.includes.is_empty() {
            lines.push(Line::from(Span::styled(
                "  Package includes:",
                Style::default().fg(Color::Green),
            )));
            for item in &prize.includes {
                lines.push(plain(format!("    • {}", item)));
            }
        }
    }

    lines.push(Line::default());
    lines.push(heading(RULE, Color::Yellow));
    lines.push(heading(
        &format!("TOTAL PRIZE VALUE: ${}", format_dollars(total_value(&prizes))),
        Color::Yellow,
    ));
    lines.push(heading(RULE, Color::Yellow));

    if won {
        lines.push(Line::default());
        lines.push(heading("Congratulations to our TEMPLE CHAMPIONS!", Color::Green));
    }

    if let Some(msg) = sponsor_message(table, &mut rand::thread_rng()) {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            msg.to_string(),
            Style::default().fg(Color::Magenta),
        )));
    }
    lines
}

pub fn to_plain_text(lines: &[Line<'_>]) -> String {
    lines
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|span| span.content.as_ref())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
