//! The interactive match: seat rotation, the inherit offer, the per-turn
//! prompt loop, and the final lap once someone crosses the win score.

use crate::{
    dice::{DiceRng, DiceSetError},
    parse::Selection,
    player::{Banked, Player, PlayerError, TurnRoll},
    rules::Rules,
};
use claim::debug_assert_lt;
use rand::{Rng, SeedableRng};
use std::{
    fmt,
    io::{self, BufRead, Write},
    sync::Arc,
};
use tabular::{row, Table};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("console i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("input ended before the match finished")]
    EndOfInput,
    #[error("a match needs at least one player")]
    NoPlayers,
    #[error(transparent)]
    DiceSet(#[from] DiceSetError),
    #[error(transparent)]
    Player(#[from] PlayerError),
}

/// Render visible faces with hidden (frozen) dice as `-`.
pub fn format_faces(faces: &[Option<u8>]) -> String {
    let faces = faces.iter().map(|face| match face {
        Some(face) => face.to_string(),
        None => "-".to_string(),
    });
    format!("[{}]", itertools::join(faces, ", "))
}

/////////////
// Console //
/////////////

/// Line-oriented prompts over any reader and writer, so matches can run
/// against scripted input.
pub struct Console<I, O> {
    input: I,
    output: O,
}

impl<I: BufRead, O: Write> Console<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, msg: impl fmt::Display) -> Result<(), MatchError> {
        writeln!(self.output, "{}", msg)?;
        Ok(())
    }

    /// Print `msg` and read one trimmed line of input.
    pub fn prompt(&mut self, msg: impl fmt::Display) -> Result<String, MatchError> {
        writeln!(self.output, "{}", msg)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(MatchError::EndOfInput);
        }
        Ok(line.trim().to_string())
    }

    /// Prompt until the answer is one of `choices` (case-insensitive).
    pub fn choose(
        &mut self,
        msg: impl fmt::Display,
        choices: &[&'static str],
    ) -> Result<&'static str, MatchError> {
        let msg = msg.to_string();
        loop {
            let answer = self.prompt(&msg)?.to_lowercase();
            if let Some(&choice) = choices.iter().find(|&&choice| choice == answer) {
                return Ok(choice);
            }
        }
    }

    pub fn into_inner(self) -> (I, O) {
        (self.input, self.output)
    }
}

//////////////
// Rotation //
//////////////

/// Set when a player ends their turn at or above the win score.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FinalLap {
    /// The seat that crossed the win score. The match ends when the rotation
    /// comes back around to it.
    pub trigger: usize,
    /// The score every remaining player has to bank past.
    pub score_to_beat: i64,
}

#[derive(Clone, Debug)]
pub struct Rotation {
    num_players: usize,
    seat: usize,
    final_lap: Option<FinalLap>,
}

impl Rotation {
    pub fn new(num_players: usize, first_seat: usize) -> Self {
        debug_assert_lt!(first_seat, num_players);
        Self {
            num_players,
            seat: first_seat,
            final_lap: None,
        }
    }

    #[inline]
    pub fn seat(&self) -> usize {
        self.seat
    }

    #[inline]
    pub fn final_lap(&self) -> Option<&FinalLap> {
        self.final_lap.as_ref()
    }

    #[inline]
    pub fn final_lap_mut(&mut self) -> Option<&mut FinalLap> {
        self.final_lap.as_mut()
    }

    pub fn start_final_lap(&mut self, score_to_beat: i64) {
        self.final_lap = Some(FinalLap {
            trigger: self.seat,
            score_to_beat,
        });
    }

    /// Move to the next seat. Returns false once the final lap is over.
    pub fn advance(&mut self) -> bool {
        self.seat = (self.seat + 1) % self.num_players;
        match self.final_lap {
            Some(lap) => self.seat != lap.trigger,
            None => true,
        }
    }
}

//////////////////
// MatchSummary //
//////////////////

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Standing {
    pub name: String,
    pub score: i64,
    pub qualified: bool,
}

/// Final standings in seat order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchSummary {
    pub standings: Vec<Standing>,
}

impl MatchSummary {
    /// The highest score. Ties go to the earlier seat.
    pub fn winner(&self) -> Option<&Standing> {
        // `max_by_key` keeps the last maximum, so search back to front
        self.standings.iter().rev().max_by_key(|standing| standing.score)
    }
}

impl fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table =
            Table::new("{:<}  {:>}  {:<}").with_row(row!("player", "score", "qualified"));
        for standing in &self.standings {
            let qualified = if standing.qualified { "yes" } else { "no" };
            table.add_row(row!(&standing.name, standing.score, qualified));
        }
        write!(f, "{}", table)?;

        if let Some(winner) = self.winner() {
            writeln!(f, "\n{} wins with a score of {}", winner.name, winner.score)?;
        }
        Ok(())
    }
}

///////////
// Match //
///////////

pub struct Match<I, O> {
    rules: Arc<Rules>,
    players: Vec<Player>,
    rotation: Rotation,
    /// The seat that played the last turn.
    previous: Option<usize>,
    console: Console<I, O>,
}

impl<I: BufRead, O: Write> Match<I, O> {
    /// Seat `num_players` players. With a `seed`, every roll and the first
    /// seat are reproducible.
    pub fn new(
        rules: Arc<Rules>,
        num_players: usize,
        seed: Option<u64>,
        console: Console<I, O>,
    ) -> Result<Self, MatchError> {
        if num_players == 0 {
            return Err(MatchError::NoPlayers);
        }

        let mut seat_rng = match seed {
            Some(seed) => DiceRng::seed_from_u64(seed),
            None => DiceRng::from_entropy(),
        };

        let players = (0..num_players)
            .map(|idx| {
                let name = format!("Player {}", idx + 1);
                match seed {
                    Some(seed) => {
                        let player_seed = seed.wrapping_add(1 + idx as u64);
                        Player::seeded(Arc::clone(&rules), player_seed, name)
                    }
                    None => Player::new(Arc::clone(&rules), name),
                }
            })
            .collect::<Vec<_>>();

        let first_seat = seat_rng.gen_range(0..num_players);

        Ok(Self {
            rules,
            players,
            rotation: Rotation::new(num_players, first_seat),
            previous: None,
            console,
        })
    }

    pub fn into_console(self) -> Console<I, O> {
        self.console
    }

    /// Play turns until the final lap completes.
    pub fn play(&mut self) -> Result<MatchSummary, MatchError> {
        info!(
            players = self.players.len(),
            first = %self.players[self.rotation.seat()].name(),
            "match started"
        );

        loop {
            let seat = self.rotation.seat();
            self.play_turn(seat)?;

            let player = &self.players[seat];
            if self.rotation.final_lap().is_none() && player.is_win_condition_met() {
                let score = player.score();
                let msg = format!(
                    "\n{} has over {} points, last turn!\n",
                    player.name(),
                    self.rules.config().win_score
                );
                info!(player = %player.name(), score, "final lap");
                self.rotation.start_final_lap(score);
                self.console.say(msg)?;
            }

            if !self.rotation.advance() {
                break;
            }
        }

        let summary = self.summary();
        if let Some(winner) = summary.winner() {
            info!(winner = %winner.name, score = winner.score, "match finished");
        }
        self.console.say(&summary)?;
        Ok(summary)
    }

    pub fn summary(&self) -> MatchSummary {
        let standings = self
            .players
            .iter()
            .map(|player| Standing {
                name: player.name().to_string(),
                score: player.score(),
                qualified: player.qualified(),
            })
            .collect();
        MatchSummary { standings }
    }

    fn play_turn(&mut self, seat: usize) -> Result<(), MatchError> {
        let player = &mut self.players[seat];
        player.make_active();
        let header = format!(
            "---------------------------------------------\n\
             {}'s turn, you are {}qualified and have {} banked points.",
            player.name(),
            if player.qualified() { "" } else { "not " },
            player.score(),
        );
        debug!(player = %player.name(), score = player.score(), "turn started");
        self.console.say(header)?;

        self.offer_inherit(seat)?;
        if let Some(previous) = self.previous.replace(seat) {
            self.players[previous].dice_set_mut().reset(false);
        }

        self.console.say("\nInitial roll!")?;
        self.roll(seat)?;

        let qualification_points = self.rules.config().qualification_points;
        while self.players[seat].is_active() {
            self.freeze(seat)?;

            let player = &self.players[seat];
            let points = player.dice_set().points();

            if player.dice_set().all_frozen() {
                self.console.say("All dice frozen, re-rolling")?;
                self.roll(seat)?;
                continue;
            }

            if !player.qualified() {
                if points < qualification_points {
                    self.console.say("\nNot qualified, must roll again")?;
                    self.roll(seat)?;
                } else {
                    self.bank(seat)?;
                }
                continue;
            }

            if let Some(lap) = self.rotation.final_lap() {
                if player.score() + i64::from(points) < lap.score_to_beat {
                    let msg = format!("Must beat {} points, re-rolling", lap.score_to_beat);
                    self.console.say(msg)?;
                    self.roll(seat)?;
                    continue;
                }
            }

            match self
                .console
                .choose("\nType 'b' to bank points or 'r' to roll", &["b", "r"])?
            {
                "b" => self.bank(seat)?,
                _ => self.roll(seat)?,
            }
        }

        Ok(())
    }

    /// Offer the previous player's leftover dice and points, if they banked
    /// and both players are qualified.
    fn offer_inherit(&mut self, seat: usize) -> Result<(), MatchError> {
        let previous = match self.previous {
            Some(previous) if previous != seat => previous,
            _ => return Ok(()),
        };

        let (last, current) = (&self.players[previous], &self.players[seat]);
        let points = last.dice_set().points();
        if points == 0 || !current.qualified() || !last.qualified() || last.score() == 0 {
            return Ok(());
        }

        let msg = format!(
            "The last player scored {} and left {} dice. Would you like to inherit \
             their score and dice? Type 'y' or 'n'",
            points,
            last.dice_set().num_unfrozen(),
        );
        if self.console.choose(msg, &["y", "n"])? == "y" {
            let inherited = last.dice_set().clone();
            let player = &mut self.players[seat];
            player.dice_set_mut().inherit(&inherited);
            debug!(player = %player.name(), points, "inherited dice");

            let msg = format!("\nRoll inherited, you have {} points", points);
            self.console.say(msg)?;
        }
        Ok(())
    }

    fn roll(&mut self, seat: usize) -> Result<(), MatchError> {
        let player = &mut self.players[seat];
        match player.roll()? {
            TurnRoll::Rolled(faces) => {
                debug!(player = %player.name(), faces = ?faces, "rolled");
                let msg = format!("You rolled the following dice: {}", format_faces(&faces));
                self.console.say(msg)?;
            }
            TurnRoll::Farkel { penalized } => {
                debug!(
                    player = %player.name(),
                    farkel_count = player.farkel_count(),
                    penalized,
                    "farkel"
                );
                self.console.say("You rolled a Farkel!\n")?;
                if penalized {
                    let msg = format!(
                        "That's {} in a row, you lose {} points",
                        self.rules.config().farkel_limit,
                        self.rules.config().farkel_penalty,
                    );
                    self.console.say(msg)?;
                }
            }
        }
        Ok(())
    }

    /// Prompt for a selection until one freezes.
    fn freeze(&mut self, seat: usize) -> Result<(), MatchError> {
        loop {
            let line = self
                .console
                .prompt("\nWrite dice indices (e.g. [0, 2]) to freeze")?;

            let selection = match line.parse::<Selection>() {
                Ok(selection) => selection,
                Err(err) => {
                    self.console.say(err)?;
                    continue;
                }
            };

            let player = &mut self.players[seat];
            match player.freeze_selection(selection) {
                Ok(gained) => {
                    let points = player.dice_set().points();
                    debug!(player = %player.name(), gained, points, "froze dice");
                    self.console.say(format!("\nYou now have {} points", points))?;
                    return Ok(());
                }
                Err(err) => self.console.say(format!("Invalid dice selection: {}", err))?,
            }
        }
    }

    fn bank(&mut self, seat: usize) -> Result<(), MatchError> {
        let player = &mut self.players[seat];
        let msg = match player.bank_points()? {
            Banked::Qualified(points) => {
                debug!(player = %player.name(), points, "qualified");
                "You qualified!".to_string()
            }
            Banked::Points(points) => {
                debug!(player = %player.name(), points, score = player.score(), "banked");
                format!("Banked {} points, your score is {}", points, player.score())
            }
        };

        let score = player.score();
        if let Some(lap) = self.rotation.final_lap_mut() {
            lap.score_to_beat = lap.score_to_beat.max(score);
        }
        self.console.say(msg)
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;

    /// Every die always shows 1, so a selection of one die is always a
    /// 1500-point straight and matches can be scripted.
    fn rigged_rules(win_score: i64) -> Arc<Rules> {
        let mut config = Config {
            num_dice: 2,
            low_face: 1,
            high_face: 1,
            win_score,
            ..Config::default()
        };
        config.points.triples = vec![1000];
        Arc::new(Rules::new(config).unwrap())
    }

    fn scripted_match(
        rules: Arc<Rules>,
        num_players: usize,
        script: &str,
    ) -> Match<&[u8], Vec<u8>> {
        let console = Console::new(script.as_bytes(), Vec::new());
        Match::new(rules, num_players, Some(42), console).unwrap()
    }

    fn output(game: Match<&[u8], Vec<u8>>) -> String {
        let (_, output) = game.into_console().into_inner();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_format_faces() {
        assert_eq!("[1, -, 3]", format_faces(&[Some(1), None, Some(3)]));
        assert_eq!("[]", format_faces(&[]));
    }

    #[test]
    fn test_console() {
        let mut console = Console::new("  hello \nx\nY\n".as_bytes(), Vec::new());

        assert_eq!("hello", console.prompt("say hi").unwrap());
        assert_eq!("y", console.choose("y or n?", &["y", "n"]).unwrap());
        assert!(matches!(console.prompt("more?"), Err(MatchError::EndOfInput)));

        let (_, output) = console.into_inner();
        let output = String::from_utf8(output).unwrap();
        assert_eq!(2, output.matches("y or n?").count());
    }

    #[test]
    fn test_rotation() {
        let mut rotation = Rotation::new(3, 1);
        assert!(rotation.advance());
        assert_eq!(2, rotation.seat());
        assert!(rotation.advance());
        assert_eq!(0, rotation.seat());

        rotation.start_final_lap(10_000);
        assert_eq!(
            Some(&FinalLap {
                trigger: 0,
                score_to_beat: 10_000
            }),
            rotation.final_lap()
        );
        assert!(rotation.advance());
        assert!(rotation.advance());
        assert!(!rotation.advance());
        assert_eq!(0, rotation.seat());
    }

    #[test]
    fn test_rotation_single_player() {
        let mut rotation = Rotation::new(1, 0);
        assert!(rotation.advance());
        rotation.start_final_lap(0);
        assert!(!rotation.advance());
    }

    #[test]
    fn test_winner_ties_go_to_first_seat() {
        let standing = |name: &str, score| Standing {
            name: name.to_string(),
            score,
            qualified: true,
        };
        let summary = MatchSummary {
            standings: vec![
                standing("Player 1", 500),
                standing("Player 2", 900),
                standing("Player 3", 900),
            ],
        };
        assert_eq!("Player 2", summary.winner().unwrap().name);
        assert!(summary.to_string().contains("Player 2 wins with a score of 900"));

        assert_eq!(None, MatchSummary { standings: vec![] }.winner());
    }

    #[test]
    fn test_no_players() {
        let console = Console::new(io::empty(), io::sink());
        assert!(matches!(
            Match::new(Rules::standard(), 0, None, console),
            Err(MatchError::NoPlayers)
        ));
    }

    #[test]
    fn test_match_runs_out_of_input() {
        let console = Console::new(io::empty(), io::sink());
        let mut game = Match::new(Rules::standard(), 2, Some(7), console).unwrap();
        assert!(matches!(game.play(), Err(MatchError::EndOfInput)));
    }

    #[test]
    fn test_single_player_match() {
        let mut game = scripted_match(
            rigged_rules(3000),
            1,
            // qualify, then bank twice
            "0\n\
             0\nb\n\
             junk\n[9]\n0\nb\n",
        );

        let summary = game.play().unwrap();
        assert_eq!(3000, summary.standings[0].score);
        assert!(summary.standings[0].qualified);

        let output = output(game);
        assert!(output.contains("You qualified!"));
        assert!(output.contains("Invalid dice selection"));
        assert!(output.contains("last turn!"));
        assert!(output.contains("Player 1 wins with a score of 3000"));
    }

    #[test]
    fn test_final_lap_with_inherit() {
        let mut game = scripted_match(
            rigged_rules(3000),
            2,
            "0\n\
             0\n\
             0\nb\n\
             n\n0\nb\n\
             n\n0\nb\n\
             y\n1\n0\nb\n",
        );

        let summary = game.play().unwrap();
        let mut scores = summary
            .standings
            .iter()
            .map(|standing| standing.score)
            .collect::<Vec<_>>();
        scores.sort_unstable();
        assert_eq!(vec![3000, 6000], scores);
        assert_eq!(6000, summary.winner().unwrap().score);

        let output = output(game);
        assert!(output.contains("Roll inherited, you have 1500 points"));
        assert!(output.contains("All dice frozen, re-rolling"));
    }
}
