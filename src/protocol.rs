//! The streaming game protocol.
//!
//! The engine speaks a line-oriented text protocol: a setup block of
//! `key value` parameters terminated by `ready`, then one update block per
//! turn (`f`/`w`/`a`/`d`/`h` observation lines between `turn N` and `go`),
//! terminated by `end`. The bot answers each block with zero or more
//! `o row col <dir>` order lines and a closing `go`.
//!
//! The driver is generic over its streams so tests can run scripted games
//! from memory.

use std::io::{BufRead, Write};

use crate::bot::{Bot, BotConfig};
use crate::engine::{GameParams, Tile, TurnClock};
use crate::error::{ProtocolError, ProtocolResult};

/// What happened in one completed turn, for logging and tracing.
#[derive(Debug, Clone, Copy)]
pub struct TurnReport {
    /// Turn number just played.
    pub turn: u32,
    /// Own units alive this turn.
    pub own_ants: usize,
    /// Orders emitted this turn.
    pub moves: usize,
    /// Milliseconds left on the clock when the turn finished.
    pub remaining_ms: i64,
}

/// Read the setup block and build the game parameters it describes.
///
/// Consumes lines up to and including `ready`. Unknown keywords are an
/// error except `player_seed`, which the engine has no use for.
///
/// # Errors
///
/// Fails on stream errors, malformed lines, or when a required parameter is
/// missing from the block.
pub fn parse_params<R: BufRead>(reader: &mut R) -> ProtocolResult<GameParams> {
    let mut load_time = None;
    let mut turn_time = None;
    let mut rows = None;
    let mut cols = None;
    let mut turns = None;
    let mut view_radius2 = None;
    let mut attack_radius2 = None;
    let mut spawn_radius2 = None;

    loop {
        let line = read_trimmed_line(reader)?.ok_or(ProtocolError::UnexpectedEof)?;
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let keyword = parts.next().unwrap_or_default();
        match keyword {
            "ready" => break,
            "turn" | "player_seed" => {}
            "loadtime" => load_time = Some(parse_number(&mut parts, "loadtime")?),
            "turntime" => turn_time = Some(parse_number(&mut parts, "turntime")?),
            "rows" => rows = Some(parse_number(&mut parts, "rows")?),
            "cols" => cols = Some(parse_number(&mut parts, "cols")?),
            "turns" => turns = Some(parse_number(&mut parts, "turns")?),
            "viewradius2" => view_radius2 = Some(parse_number(&mut parts, "viewradius2")?),
            "attackradius2" => attack_radius2 = Some(parse_number(&mut parts, "attackradius2")?),
            "spawnradius2" => spawn_radius2 = Some(parse_number(&mut parts, "spawnradius2")?),
            _ => return Err(ProtocolError::UnknownKeyword(line)),
        }
    }

    Ok(GameParams {
        load_time_ms: narrow(load_time.ok_or(ProtocolError::MissingParameter("loadtime"))?)?,
        turn_time_ms: narrow(turn_time.ok_or(ProtocolError::MissingParameter("turntime"))?)?,
        rows: narrow(rows.ok_or(ProtocolError::MissingParameter("rows"))?)?,
        cols: narrow(cols.ok_or(ProtocolError::MissingParameter("cols"))?)?,
        turns: narrow(turns.ok_or(ProtocolError::MissingParameter("turns"))?)?,
        view_radius2: narrow(view_radius2.ok_or(ProtocolError::MissingParameter("viewradius2"))?)?,
        attack_radius2: narrow(
            attack_radius2.ok_or(ProtocolError::MissingParameter("attackradius2"))?,
        )?,
        spawn_radius2: narrow(spawn_radius2.ok_or(ProtocolError::MissingParameter("spawnradius2"))?)?,
    })
}

/// Drives a [`Bot`] over a pair of protocol streams.
#[derive(Debug)]
pub struct Driver<R, W> {
    reader: R,
    writer: W,
    bot: Bot,
}

impl<R: BufRead, W: Write> Driver<R, W> {
    /// Perform the setup handshake and build the bot.
    ///
    /// # Errors
    ///
    /// Fails when the setup block is malformed or a stream breaks.
    pub fn setup(mut reader: R, mut writer: W, config: BotConfig) -> ProtocolResult<Self> {
        let params = parse_params(&mut reader)?;
        let bot = Bot::new(params, config);
        writeln!(writer, "go")?;
        writer.flush()?;
        Ok(Self {
            reader,
            writer,
            bot,
        })
    }

    /// The bot being driven.
    #[must_use]
    pub const fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Play turns until the stream says `end` or closes.
    ///
    /// `observer` sees one [`TurnReport`] per completed turn.
    ///
    /// # Errors
    ///
    /// Fails on stream errors or malformed update lines.
    pub fn run(&mut self, observer: &mut dyn FnMut(&TurnReport)) -> ProtocolResult<()> {
        let mut clock = TurnClock::start(self.bot.grid().params().turn_time_ms);
        let mut turn = 0u32;
        loop {
            let Some(line) = read_trimmed_line(&mut self.reader)? else {
                return Ok(());
            };
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let keyword = parts.next().unwrap_or_default();
            match keyword {
                "end" => return Ok(()),
                "turn" => {
                    clock = TurnClock::start(self.bot.grid().params().turn_time_ms);
                    turn = narrow(parse_number(&mut parts, "turn")?)?;
                    self.bot.begin_turn();
                }
                "w" => {
                    let tile = self.parse_bounded_tile(&mut parts, "w")?;
                    self.bot.observe_water(tile);
                }
                "f" => {
                    let tile = self.parse_bounded_tile(&mut parts, "f")?;
                    self.bot.observe_food(tile);
                }
                "a" => {
                    let (tile, owner) = self.parse_bounded_owned_tile(&mut parts, "a")?;
                    self.bot.observe_ant(tile, owner);
                }
                "d" => {
                    let (tile, owner) = self.parse_bounded_owned_tile(&mut parts, "d")?;
                    self.bot.observe_dead(tile, owner);
                }
                "h" => {
                    let (tile, owner) = self.parse_bounded_owned_tile(&mut parts, "h")?;
                    self.bot.observe_hill(tile, owner);
                }
                "go" => {
                    let moves = self.bot.take_turn(&clock);
                    for &(source, direction) in &moves {
                        writeln!(self.writer, "o {} {} {}", source.row, source.col, direction)?;
                    }
                    writeln!(self.writer, "go")?;
                    self.writer.flush()?;
                    observer(&TurnReport {
                        turn,
                        own_ants: self.bot.grid().own_ants().len(),
                        moves: moves.len(),
                        remaining_ms: clock.remaining_ms(),
                    });
                }
                _ => return Err(ProtocolError::UnknownKeyword(line)),
            }
        }
    }

    fn parse_bounded_tile<'a, I>(&self, parts: &mut I, keyword: &'static str) -> ProtocolResult<Tile>
    where
        I: Iterator<Item = &'a str>,
    {
        let tile = parse_tile(parts, keyword)?;
        let params = self.bot.grid().params();
        if tile.row >= params.rows || tile.col >= params.cols {
            return Err(ProtocolError::OutOfBounds(format!(
                "{} {}",
                tile.row, tile.col
            )));
        }
        Ok(tile)
    }

    fn parse_bounded_owned_tile<'a, I>(
        &self,
        parts: &mut I,
        keyword: &'static str,
    ) -> ProtocolResult<(Tile, i8)>
    where
        I: Iterator<Item = &'a str>,
    {
        let tile = self.parse_bounded_tile(parts, keyword)?;
        let owner = narrow(parse_number(parts, keyword)?)?;
        Ok((tile, owner))
    }
}

fn read_trimmed_line<R: BufRead>(reader: &mut R) -> ProtocolResult<Option<String>> {
    let mut line = String::new();
    let read = reader.read_line(&mut line)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn parse_number<'a, I>(parts: &mut I, keyword: &'static str) -> ProtocolResult<i64>
where
    I: Iterator<Item = &'a str>,
{
    let token = parts.next().ok_or(ProtocolError::MissingArgument(keyword))?;
    Ok(token.parse::<i64>()?)
}

fn parse_tile<'a, I>(parts: &mut I, keyword: &'static str) -> ProtocolResult<Tile>
where
    I: Iterator<Item = &'a str>,
{
    let row = narrow(parse_number(parts, keyword)?)?;
    let col = narrow(parse_number(parts, keyword)?)?;
    Ok(Tile::new(row, col))
}

fn narrow<T: TryFrom<i64>>(value: i64) -> ProtocolResult<T> {
    T::try_from(value).map_err(|_| ProtocolError::InvalidNumber(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SETUP: &str = "turn 0\nloadtime 3000\nturntime 1000\nrows 20\ncols 20\nturns 500\nviewradius2 55\nattackradius2 5\nspawnradius2 1\nplayer_seed 42\nready\n";

    #[test]
    fn test_parse_params_full_block() {
        let mut reader = Cursor::new(SETUP);
        let params = parse_params(&mut reader).expect("setup should parse");
        assert_eq!(params.rows, 20);
        assert_eq!(params.cols, 20);
        assert_eq!(params.view_radius2, 55);
        assert_eq!(params.turn_time_ms, 1000);
    }

    #[test]
    fn test_parse_params_missing_parameter() {
        let mut reader = Cursor::new("rows 20\nready\n");
        let err = parse_params(&mut reader).expect_err("incomplete setup");
        assert!(matches!(err, ProtocolError::MissingParameter(_)));
    }

    #[test]
    fn test_parse_params_unknown_keyword() {
        let mut reader = Cursor::new("bogus 1\nready\n");
        let err = parse_params(&mut reader).expect_err("unknown keyword");
        assert!(matches!(err, ProtocolError::UnknownKeyword(_)));
    }

    #[test]
    fn test_setup_handshake_answers_go() {
        let reader = Cursor::new(SETUP.to_string());
        let mut output = Vec::new();
        let _driver = Driver::setup(reader, &mut output, BotConfig::default())
            .expect("setup should succeed");
        assert_eq!(String::from_utf8_lossy(&output), "go\n");
    }

    #[test]
    fn test_single_turn_emits_orders_and_go() {
        let game = format!("{SETUP}turn 1\na 10 10 0\nf 10 14\ngo\nend\n");
        let reader = Cursor::new(game);
        let mut output = Vec::new();
        let mut reports = Vec::new();
        let mut driver = Driver::setup(reader, &mut output, BotConfig::default())
            .expect("setup should succeed");
        driver
            .run(&mut |report| reports.push(*report))
            .expect("game should run");

        assert_eq!(driver.bot().turn(), 1);
        let text = String::from_utf8_lossy(&output);
        assert!(text.contains("o 10 10 E"));
        assert!(text.ends_with("go\n"));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].turn, 1);
        assert_eq!(reports[0].own_ants, 1);
        assert_eq!(reports[0].moves, 1);
    }

    #[test]
    fn test_malformed_update_line_is_an_error() {
        let game = format!("{SETUP}turn 1\na ten ten 0\ngo\n");
        let reader = Cursor::new(game);
        let mut output = Vec::new();
        let mut driver = Driver::setup(reader, &mut output, BotConfig::default())
            .expect("setup should succeed");
        let err = driver.run(&mut |_| {}).expect_err("bad line");
        assert!(matches!(err, ProtocolError::InvalidNumber(_)));
    }

    #[test]
    fn test_off_map_coordinate_is_an_error() {
        let game = format!("{SETUP}turn 1\na 25 3 0\ngo\n");
        let reader = Cursor::new(game);
        let mut output = Vec::new();
        let mut driver = Driver::setup(reader, &mut output, BotConfig::default())
            .expect("setup should succeed");
        let err = driver.run(&mut |_| {}).expect_err("row 25 on a 20-row map");
        assert!(matches!(err, ProtocolError::OutOfBounds(_)));
    }

    #[test]
    fn test_eof_without_end_is_clean() {
        let game = format!("{SETUP}turn 1\ngo\n");
        let reader = Cursor::new(game);
        let mut output = Vec::new();
        let mut driver = Driver::setup(reader, &mut output, BotConfig::default())
            .expect("setup should succeed");
        driver.run(&mut |_| {}).expect("eof is a normal finish");
    }
}
