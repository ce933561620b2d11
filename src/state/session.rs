use uuid::Uuid;

use crate::catalog::{CountryRecord, GameMode};

/// Identifier of a scoring slot. Exactly three exist; anything else is
/// rejected at the parse boundary instead of growing the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamId {
    /// The red team.
    Red,
    /// The neutral "no one scored" slot, labelled Draw in the UI.
    Draw,
    /// The green team.
    Green,
}

impl TeamId {
    /// Parse a team identifier from the presentation layer. `blue` is the
    /// historical element id of the draw slot and stays accepted.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "red" => Some(Self::Red),
            "draw" | "blue" => Some(Self::Draw),
            "green" => Some(Self::Green),
            _ => None,
        }
    }
}

/// Fixed-cardinality scoreboard for the three scoring slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct TeamScores {
    /// Rounds claimed by the red team.
    pub red: u32,
    /// Rounds nobody claimed.
    pub draw: u32,
    /// Rounds claimed by the green team.
    pub green: u32,
}

/// Final standing computed when a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A single team holds the highest score.
    Winner(TeamId),
    /// Red and green finished level.
    Tie,
    /// The draw tally alone holds the maximum.
    MostDraws,
}

impl TeamScores {
    /// Current score for one slot.
    pub fn get(&self, team: TeamId) -> u32 {
        match team {
            TeamId::Red => self.red,
            TeamId::Draw => self.draw,
            TeamId::Green => self.green,
        }
    }

    /// Add one point to a slot and return its new value.
    pub fn increment(&mut self, team: TeamId) -> u32 {
        let slot = match team {
            TeamId::Red => &mut self.red,
            TeamId::Draw => &mut self.draw,
            TeamId::Green => &mut self.green,
        };
        *slot += 1;
        *slot
    }

    /// Compute the final standing. A real team beats an equal draw tally;
    /// equal red and green maxima are a tie.
    pub fn outcome(&self) -> SessionOutcome {
        let max = self.red.max(self.green).max(self.draw);
        let red_leads = self.red == max;
        let green_leads = self.green == max;

        match (red_leads, green_leads) {
            (true, true) => SessionOutcome::Tie,
            (true, false) => SessionOutcome::Winner(TeamId::Red),
            (false, true) => SessionOutcome::Winner(TeamId::Green),
            (false, false) => SessionOutcome::MostDraws,
        }
    }
}

/// Mutable per-session data, owned by the engine and discarded at reset.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Identifier of this session, used in logs and event payloads.
    pub id: Uuid,
    /// The filtered country list this session plays over.
    pub countries: Vec<CountryRecord>,
    /// Traversal order: indices into `countries`, each exactly once.
    pub sequence: Vec<usize>,
    /// Position in `sequence`; equal to its length when the session is over.
    pub current_index: usize,
    /// Scoreboard for the three slots.
    pub scores: TeamScores,
    /// Quiz variant for this session.
    pub game_mode: GameMode,
    /// Whether the session auto-advances without manual scoring.
    pub practice: bool,
}

impl SessionState {
    /// Build a fresh session over an already-filtered country list.
    pub fn new(
        countries: Vec<CountryRecord>,
        sequence: Vec<usize>,
        game_mode: GameMode,
        practice: bool,
    ) -> Self {
        debug_assert_eq!(countries.len(), sequence.len());
        Self {
            id: Uuid::new_v4(),
            countries,
            sequence,
            current_index: 0,
            scores: TeamScores::default(),
            game_mode,
            practice,
        }
    }

    /// Total number of rounds in the session.
    pub fn total_rounds(&self) -> usize {
        self.sequence.len()
    }

    /// Whether a round remains to be played.
    pub fn has_next(&self) -> bool {
        self.current_index < self.sequence.len()
    }

    /// The country for the current round, or `None` once exhausted.
    pub fn current_country(&self) -> Option<&CountryRecord> {
        self.sequence
            .get(self.current_index)
            .map(|&index| &self.countries[index])
    }

    /// Step to the next position in the sequence.
    pub fn advance(&mut self) {
        if self.has_next() {
            self.current_index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::GameMode;

    fn country(name: &str) -> CountryRecord {
        CountryRecord {
            continent: "Europe".into(),
            english_name: name.into(),
            local_name: name.into(),
            flag_url: format!("https://flags.example/{name}.svg"),
            sovereign: true,
            capital: None,
        }
    }

    fn session(n: usize) -> SessionState {
        let countries: Vec<_> = (0..n).map(|i| country(&format!("c{i}"))).collect();
        let sequence = (0..n).collect();
        SessionState::new(countries, sequence, GameMode::Flags, false)
    }

    #[test]
    fn parse_accepts_blue_as_draw_and_rejects_unknown() {
        assert_eq!(TeamId::parse("red"), Some(TeamId::Red));
        assert_eq!(TeamId::parse("blue"), Some(TeamId::Draw));
        assert_eq!(TeamId::parse("draw"), Some(TeamId::Draw));
        assert_eq!(TeamId::parse("green"), Some(TeamId::Green));
        assert_eq!(TeamId::parse("purple"), None);
        assert_eq!(TeamId::parse(""), None);
    }

    #[test]
    fn increment_touches_exactly_one_slot() {
        let mut scores = TeamScores::default();
        assert_eq!(scores.increment(TeamId::Green), 1);
        assert_eq!(scores.red, 0);
        assert_eq!(scores.draw, 0);
        assert_eq!(scores.green, 1);
    }

    #[test]
    fn outcome_prefers_real_teams_over_draws() {
        let scores = TeamScores {
            red: 3,
            draw: 3,
            green: 1,
        };
        assert_eq!(scores.outcome(), SessionOutcome::Winner(TeamId::Red));
    }

    #[test]
    fn outcome_reports_most_draws_when_draw_alone_leads() {
        let scores = TeamScores {
            red: 1,
            draw: 4,
            green: 2,
        };
        assert_eq!(scores.outcome(), SessionOutcome::MostDraws);
    }

    #[test]
    fn equal_red_and_green_is_a_tie() {
        let scores = TeamScores {
            red: 2,
            draw: 0,
            green: 2,
        };
        assert_eq!(scores.outcome(), SessionOutcome::Tie);

        let all_level = TeamScores {
            red: 2,
            draw: 2,
            green: 2,
        };
        assert_eq!(all_level.outcome(), SessionOutcome::Tie);
    }

    #[test]
    fn advance_stops_at_the_sequence_end() {
        let mut state = session(2);
        assert!(state.has_next());
        state.advance();
        state.advance();
        assert!(!state.has_next());
        assert_eq!(state.current_country(), None);

        state.advance();
        assert_eq!(state.current_index, 2);
    }

    #[test]
    fn current_country_follows_the_sequence() {
        let countries = vec![country("a"), country("b"), country("c")];
        let state = SessionState::new(countries, vec![2, 0, 1], GameMode::Flags, false);
        assert_eq!(state.current_country().unwrap().english_name, "c");
    }
}
