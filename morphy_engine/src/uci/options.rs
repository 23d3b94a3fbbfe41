//! The UCI option table: registration, validation, and the deferred work
//! items an option change produces.

use crate::consts::{default_threads, DEFAULT_HASH_MB, MAX_HASH_MB, MAX_THREADS, MIN_HASH_MB};

/// Side effects an accepted option change requests from the controller.
#[derive(Debug, PartialEq, Eq)]
pub enum OptionWork {
    ClearHash,
    ResizeHash(usize),
    Threads(usize),
}

impl OptionWork {
    /// Whether the work can be applied while a search is in flight.
    pub fn usable_while_searching(&self) -> bool {
        false
    }
}

/// The recognized options and their current values.
pub struct UciOptions {
    pub hash_mb: usize,
    pub threads: usize,
    pub ponder: bool,
    pub own_book: bool,
    pub analyse_mode: bool,
    pub opponent: String,
    work: Vec<OptionWork>,
}

impl Default for UciOptions {
    fn default() -> Self {
        UciOptions::new()
    }
}

impl UciOptions {
    pub fn new() -> UciOptions {
        UciOptions {
            hash_mb: DEFAULT_HASH_MB,
            threads: default_threads(),
            ponder: true,
            own_book: true,
            analyse_mode: false,
            opponent: String::from("?"),
            work: Vec::new(),
        }
    }

    /// Prints the option table the way `uci` expects it.
    pub fn display_all(&self) {
        println!(
            "option name Hash type spin default {} min {} max {}",
            DEFAULT_HASH_MB, MIN_HASH_MB, MAX_HASH_MB
        );
        println!("option name ClearHash type button");
        println!(
            "option name Threads type spin default {} min 1 max {}",
            default_threads(),
            MAX_THREADS
        );
        println!("option name Ponder type check default true");
        println!("option name OwnBook type check default true");
        println!("option name UCI_AnalyseMode type check default false");
        println!("option name UCI_Opponent type string default ?");
    }

    /// Applies a named option. Returns false (and changes nothing) for an
    /// unknown name or an out-of-range value.
    pub fn apply(&mut self, name: &str, value: &str) -> bool {
        match name {
            "Hash" => match value.parse::<usize>() {
                Ok(mb) if (MIN_HASH_MB..=MAX_HASH_MB).contains(&mb) => {
                    self.hash_mb = mb;
                    self.work.push(OptionWork::ResizeHash(mb));
                    true
                }
                _ => false,
            },
            "ClearHash" => {
                self.work.push(OptionWork::ClearHash);
                true
            }
            "Threads" => match value.parse::<usize>() {
                Ok(n) if (1..=MAX_THREADS).contains(&n) => {
                    self.threads = n;
                    self.work.push(OptionWork::Threads(n));
                    true
                }
                _ => false,
            },
            "Ponder" => parse_bool(value).map(|b| self.ponder = b).is_some(),
            "OwnBook" => parse_bool(value).map(|b| self.own_book = b).is_some(),
            "UCI_AnalyseMode" => parse_bool(value)
                .map(|b| self.analyse_mode = b)
                .is_some(),
            "UCI_Opponent" => {
                self.opponent = value.to_string();
                true
            }
            _ => false,
        }
    }

    /// Pops the next pending work item, if any.
    pub fn work(&mut self) -> Option<OptionWork> {
        self.work.pop()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "True" | "TRUE" | "1" | "on" => Some(true),
        "false" | "False" | "FALSE" | "0" | "off" => Some(false),
        _ => None,
    }
}
