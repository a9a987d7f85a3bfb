//! Play command - a human plays against a freshly trained agent in the terminal

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::Args;

use tabchess_core::{color_name, ActionKey, Color, GameState, GameStatus, Square};
use tabchess_learn::TabularAgent;

use crate::train_cmd::{train_agent, TrainingArgs};

#[derive(Args)]
pub struct PlayArgs {
    #[command(flatten)]
    pub training: TrainingArgs,

    /// Force pure exploitation instead of the exploration rate training ended with
    #[arg(long)]
    pub greedy: bool,

    /// Start from this FEN instead of the standard position
    #[arg(long)]
    pub fen: Option<String>,
}

/// Run play command
pub fn run(args: PlayArgs, seed: Option<u64>) -> Result<()> {
    let game = match &args.fen {
        Some(fen) => GameState::from_fen(fen).context("Invalid --fen")?,
        None => GameState::new(),
    };

    println!("Training agent for {} episodes...", args.training.episodes);
    let (mut agent, _) = train_agent(&args.training, seed, args.training.quiet)?;

    if args.greedy {
        tracing::warn!(
            "Overriding exploration rate {:.3} with 0 for play",
            agent.epsilon()
        );
        agent.set_epsilon(0.0);
    } else {
        tracing::info!("Agent keeps exploration rate {:.3}", agent.epsilon());
    }

    let human = !Color::from(args.training.agent_color);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let status = play_session(&mut agent, game, human, stdin.lock(), &mut stdout)?;

    println!("{}", status);
    Ok(())
}

/// Alternate human and agent moves until the game ends or input runs out.
///
/// Returns the status of the final position; `Ongoing` means the human quit.
pub fn play_session<R: BufRead, W: Write>(
    agent: &mut TabularAgent,
    mut game: GameState,
    human: Color,
    mut input: R,
    out: &mut W,
) -> Result<GameStatus> {
    writeln!(out, "You play {}. Enter moves in UCI (e2e4, e7e8q).", color_name(human))?;

    while !game.is_terminal() {
        if game.turn() != human {
            let legal = game.legal_actions();
            let Some(action) = agent.choose_move(&game.key(), &legal) else {
                break;
            };
            game.apply_action(&action)
                .context("Agent produced an illegal move")?;
            writeln!(out, "Agent plays {}", action)?;
            continue;
        }

        write!(
            out,
            "\n{}\nFEN: {}\n{} to move> ",
            render_board(&game),
            game.fen(),
            color_name(human)
        )?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }

        match line.trim() {
            "" => continue,
            "quit" | "exit" => break,
            "moves" => {
                let legal: Vec<String> =
                    game.legal_actions().into_iter().map(ActionKey::into_string).collect();
                writeln!(out, "Legal moves: {}", legal.join(" "))?;
            }
            text => {
                if let Err(e) = apply_human_move(&mut game, text) {
                    writeln!(out, "{}", e)?;
                }
            }
        }
    }

    if game.is_terminal() {
        writeln!(out, "\n{}\nFEN: {}", render_board(&game), game.fen())?;
    }
    Ok(game.status())
}

fn apply_human_move(game: &mut GameState, text: &str) -> Result<()> {
    let action = match ActionKey::parse(text) {
        Ok(action) => action,
        Err(_) => bail!("Invalid move format '{}'", text),
    };
    if game.apply_action(&action).is_err() {
        bail!("Illegal move '{}'", text);
    }
    Ok(())
}

/// Text diagram with rank 8 at the top, uppercase for White
pub fn render_board(game: &GameState) -> String {
    let mut lines = Vec::with_capacity(9);
    for rank in (0..8).rev() {
        let mut line = format!("{}", rank + 1);
        for file in 0..8 {
            let square = Square::ALL[rank * 8 + file];
            let symbol = game.piece_at(square).map_or('.', |p| p.char());
            line.push(' ');
            line.push(symbol);
        }
        lines.push(line);
    }
    lines.push("  a b c d e f g h".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabchess_learn::AgentConfig;

    fn agent() -> TabularAgent {
        let mut agent = TabularAgent::new(AgentConfig::default().with_seed(5)).unwrap();
        agent.set_epsilon(0.0);
        agent
    }

    fn session(game: GameState, human: Color, input: &str) -> (GameStatus, String) {
        let mut out = Vec::new();
        let status =
            play_session(&mut agent(), game, human, input.as_bytes(), &mut out).unwrap();
        (status, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_render_start_board() {
        let board = render_board(&GameState::new());
        let lines: Vec<&str> = board.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "8 r n b q k b n r");
        assert_eq!(lines[4], "4 . . . . . . . .");
        assert_eq!(lines[7], "1 R N B Q K B N R");
        assert_eq!(lines[8], "  a b c d e f g h");
    }

    #[test]
    fn test_human_move_then_agent_reply() {
        let (status, out) = session(GameState::new(), Color::White, "e2e4\nquit\n");
        assert_eq!(status, GameStatus::Ongoing);
        assert!(out.contains("Agent plays"));
    }

    #[test]
    fn test_agent_moves_first_as_white() {
        let (_, out) = session(GameState::new(), Color::Black, "quit\n");
        let agent_pos = out.find("Agent plays").unwrap();
        let prompt_pos = out.find("Black to move>").unwrap();
        assert!(agent_pos < prompt_pos);
    }

    #[test]
    fn test_bad_input_is_reported() {
        let (_, out) = session(GameState::new(), Color::White, "hello\ne2e5\nquit\n");
        assert!(out.contains("Invalid move format 'hello'"));
        assert!(out.contains("Illegal move 'e2e5'"));
        assert!(!out.contains("Agent plays"));
    }

    #[test]
    fn test_moves_lists_legal_actions() {
        let (_, out) = session(GameState::new(), Color::White, "moves\nquit\n");
        assert!(out.contains("Legal moves:"));
        assert!(out.contains("g1f3"));
    }

    #[test]
    fn test_prompt_shows_full_fen() {
        let (_, out) = session(GameState::new(), Color::White, "quit\n");
        assert!(out.contains("FEN: rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"));
    }

    #[test]
    fn test_end_of_input_stops_session() {
        let (status, _) = session(GameState::new(), Color::White, "");
        assert_eq!(status, GameStatus::Ongoing);
    }

    #[test]
    fn test_human_delivers_mate() {
        let game = GameState::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let (status, out) = session(game, Color::White, "a1a8\n");
        assert_eq!(status, GameStatus::Checkmate { winner: Color::White });
        assert!(out.contains("8 R . . . . . k ."));
    }
}
