use crate::{
    config::Config,
    game::{Console, Match},
    parse::FaceList,
    rules::Rules,
    score::Scored,
};
use std::{fmt, io, str::FromStr, sync::Arc, time::Instant};
use tabular::{row, Table};

/// The standard rules, or the rules from a JSON config file.
fn load_rules(config_path: Option<&str>) -> Result<Arc<Rules>, String> {
    let path = match config_path {
        Some(path) => path,
        None => return Ok(Rules::standard()),
    };

    let config = Config::from_json_file(path).map_err(|err| format!("{path}: {err}"))?;
    let rules = time!("build rules", { Rules::new(config) }).map_err(|err| err.to_string())?;
    Ok(Arc::new(rules))
}

/// Two-column `label  value` table for command summaries.
fn summary_table<'a>(rows: impl IntoIterator<Item = (&'a str, String)>) -> Table {
    let mut table = Table::new("{:>}  {:<}");
    for (label, value) in rows {
        table.add_row(row!(label, value));
    }
    table
}

//////////
// Args //
//////////

/// Typed access to the raw arguments. Every parse failure is reported with
/// the argument's label.
pub struct Args(pico_args::Arguments);

impl Args {
    pub fn new(inner: pico_args::Arguments) -> Self {
        Self(inner)
    }

    fn subcommand(&mut self) -> Result<Option<String>, String> {
        self.0.subcommand().map_err(|err| err.to_string())
    }

    fn option<T>(
        &mut self,
        label: &'static str,
        keys: impl Into<pico_args::Keys>,
    ) -> Result<Option<T>, String>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.0
            .opt_value_from_fn(keys, |s| T::from_str(s).map_err(|err| err.to_string()))
            .map_err(|err| format!("invalid {label}: {err}"))
    }

    fn positional<T>(&mut self, label: &'static str) -> Result<T, String>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.0
            .free_from_fn(|s| T::from_str(s).map_err(|err| err.to_string()))
            .map_err(|err| format!("invalid {label}: {err}"))
    }

    fn finish(self) -> Result<(), String> {
        let leftover = self.0.finish();
        if leftover.is_empty() {
            Ok(())
        } else {
            Err(format!("unexpected arguments left: '{:?}'", leftover))
        }
    }

    fn help_requested(&mut self, usage: &str) {
        if self.0.contains(["-h", "--help"]) {
            print!("{}", usage);
            std::process::exit(0);
        }
    }
}

///////////////////
// Command trait //
///////////////////

pub trait Command: Sized {
    const USAGE: &'static str;

    type Output: fmt::Display;

    fn try_from_cli_args(args: Args) -> Result<Self, String>;
    fn run(self) -> Result<Self::Output, String>;
}

/////////////////
// PlayCommand //
/////////////////

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayCommand {
    players: usize,
    seed: Option<u64>,
    config: Option<String>,
}

impl Command for PlayCommand {
    const USAGE: &'static str = "\
farkel play - play an interactive match on the console

USAGE:
    farkel play [option ...]

EXAMPLES:
    farkel play
    farkel play -p 3 -s 1234

OPTIONS:
    · --players / -p n (default: 2)
      The number of players taking turns at this console.

    · --seed / -s seed
      Seed every dice roll, making the match reproducible.

    · --config / -c file.json
      Play with the rules from a JSON config instead of the standard rules.
";

    type Output = Table;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        args.help_requested(Self::USAGE);

        let cmd = Self {
            players: args.option("number of players", ["-p", "--players"])?.unwrap_or(2),
            seed: args.option("seed", ["-s", "--seed"])?,
            config: args.option("config", ["-c", "--config"])?,
        };
        args.finish()?;

        if cmd.players == 0 {
            return Err("a match needs at least one player".to_string());
        }
        Ok(cmd)
    }

    fn run(self) -> Result<Self::Output, String> {
        let rules = load_rules(self.config.as_deref())?;
        let console = Console::new(io::stdin().lock(), io::stdout().lock());

        let start_time = Instant::now();
        let mut game =
            Match::new(rules, self.players, self.seed, console).map_err(|err| err.to_string())?;
        let summary = game.play().map_err(|err| err.to_string())?;
        let match_duration = start_time.elapsed();

        let mut rows = vec![("match duration", format!("{:.2?}", match_duration))];
        rows.extend(self.seed.map(|seed| ("seed", seed.to_string())));
        rows.extend(
            summary
                .winner()
                .map(|winner| ("winner", format!("{} ({})", winner.name, winner.score))),
        );

        Ok(summary_table(rows))
    }
}

//////////////////
// ScoreCommand //
//////////////////

#[derive(Clone, Debug)]
pub struct ScoreCommand {
    dice: FaceList,
    config: Option<String>,
}

impl Command for ScoreCommand {
    const USAGE: &'static str = "\
farkel score - score a set of dice the way the game does

USAGE:
    farkel score [option ...] <dice>

EXAMPLES:
    farkel score [1,1,1,2,3,4]
    farkel score -c house-rules.json [5,5,5,5,2,2]

OPTIONS:
    · --config / -c file.json
      Score with the rules from a JSON config instead of the standard rules.
";

    type Output = ScoreCommandOutput;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        args.help_requested(Self::USAGE);

        let config = args.option("config", ["-c", "--config"])?;
        let dice = args.positional("dice")?;
        args.finish()?;

        Ok(Self { dice, config })
    }

    fn run(self) -> Result<Self::Output, String> {
        let rules = load_rules(self.config.as_deref())?;
        let counts = self.dice.to_counts(rules.config())?;
        Ok(ScoreCommandOutput {
            scored: rules.table().score(counts),
        })
    }
}

pub struct ScoreCommandOutput {
    scored: Scored,
}

impl fmt::Display for ScoreCommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = Table::new("{:<}  {:<}  {:>}").with_row(row!("combo", "dice", "points"));

        for pattern in &self.scored.matched {
            table.add_row(row!(pattern.combo(), pattern.counts(), pattern.points()));
        }

        let mut totals = vec![
            ("total points", self.scored.points.to_string()),
            ("unscored dice", self.scored.unscored.to_string()),
        ];
        if self.scored.is_farkel() {
            totals.push(("farkel", "yes".to_string()));
        }

        write!(f, "\n{}\n{}", table, summary_table(totals))
    }
}

//////////////////
// RulesCommand //
//////////////////

#[derive(Clone, Debug)]
pub struct RulesCommand {
    config: Option<String>,
}

impl Command for RulesCommand {
    const USAGE: &'static str = "\
farkel rules - list every scoring pattern, highest precedence first

USAGE:
    farkel rules [option ...]

OPTIONS:
    · --config / -c file.json
      List the rules from a JSON config instead of the standard rules.
";

    type Output = Table;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        args.help_requested(Self::USAGE);

        let config = args.option("config", ["-c", "--config"])?;
        args.finish()?;

        Ok(Self { config })
    }

    fn run(self) -> Result<Self::Output, String> {
        let rules = load_rules(self.config.as_deref())?;

        let mut table =
            Table::new("{:>}  {:<}  {:<}  {:>}").with_row(row!("#", "combo", "dice", "points"));
        for (idx, pattern) in rules.table().iter().enumerate() {
            table.add_row(row!(
                idx + 1,
                pattern.combo(),
                pattern.counts(),
                pattern.points()
            ));
        }

        Ok(table)
    }
}

/////////////////
// BaseCommand //
/////////////////

#[derive(Debug)]
pub enum BaseCommand {
    Play(PlayCommand),
    Score(ScoreCommand),
    Rules(RulesCommand),
}

impl Command for BaseCommand {
    const USAGE: &'static str = "\
farkel - play the dice game Farkel on the console

USAGE:
    farkel [option ...] <subcommand>

SUBCOMMANDS:
    · farkel play - play an interactive match on the console
    · farkel score - score a set of dice the way the game does
    · farkel rules - list every scoring pattern, highest precedence first
";

    type Output = String;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        let maybe_subcommand = args.subcommand()?;

        match maybe_subcommand.as_deref() {
            Some("play") => Ok(Self::Play(PlayCommand::try_from_cli_args(args)?)),
            Some("score") => Ok(Self::Score(ScoreCommand::try_from_cli_args(args)?)),
            Some("rules") => Ok(Self::Rules(RulesCommand::try_from_cli_args(args)?)),
            Some(command) => Err(format!("'{}' is not a recognized command", command)),
            None => {
                args.help_requested(Self::USAGE);
                Err("no subcommand specified".to_string())
            }
        }
    }

    fn run(self) -> Result<String, String> {
        match self {
            Self::Play(cmd) => cmd.run().map(|out| out.to_string()),
            Self::Score(cmd) => cmd.run().map(|out| out.to_string()),
            Self::Rules(cmd) => cmd.run().map(|out| out.to_string()),
        }
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod test {
    use super::*;
    use claim::{assert_err, assert_matches};
    use std::ffi::OsString;

    fn args(argv: &[&str]) -> Args {
        Args::new(pico_args::Arguments::from_vec(
            argv.iter().map(OsString::from).collect(),
        ))
    }

    fn parse(argv: &[&str]) -> Result<BaseCommand, String> {
        BaseCommand::try_from_cli_args(args(argv))
    }

    #[test]
    fn test_parse_play() {
        let cmd = parse(&["play", "-p", "3", "--seed", "42"]).unwrap();
        assert_matches!(
            cmd,
            BaseCommand::Play(PlayCommand {
                players: 3,
                seed: Some(42),
                config: None,
            })
        );

        let cmd = parse(&["play"]).unwrap();
        assert_matches!(
            cmd,
            BaseCommand::Play(PlayCommand {
                players: 2,
                seed: None,
                ..
            })
        );

        assert_err!(parse(&["play", "-p", "0"]));
        assert_err!(parse(&["play", "-p", "two"]));
        assert_err!(parse(&["play", "extra"]));
    }

    #[test]
    fn test_parse_errors() {
        assert_err!(parse(&[]));
        assert_err!(parse(&["bogus"]));
        assert_err!(parse(&["score"]));
        assert_err!(parse(&["score", "[1,x]"]));
        assert_err!(parse(&["rules", "extra"]));
    }

    #[test]
    fn test_score_command() {
        let output = parse(&["score", "[1,1,1,2,3,4]"]).unwrap().run().unwrap();
        assert!(output.contains("three 1s"));
        assert!(output.contains("1000"));
        assert!(output.contains("[2, 3, 4]"));

        let output = parse(&["score", "2 3 4 6 2 3"]).unwrap().run().unwrap();
        assert!(output.contains("farkel"));

        assert_err!(parse(&["score", "[1,7]"]).unwrap().run());
        assert_err!(parse(&["score", "[1,1,1,1,1,1,1]"]).unwrap().run());
    }

    #[test]
    fn test_rules_command() {
        let output = parse(&["rules"]).unwrap().run().unwrap();
        assert!(output.contains("straight"));
        assert!(output.contains("four of a kind + pair"));
        assert!(output.contains("92"));
    }

    #[test]
    fn test_missing_config_file() {
        let cmd = parse(&["rules", "-c", "/definitely/not/a/farkel/config.json"]).unwrap();
        assert_err!(cmd.run());
    }
}
