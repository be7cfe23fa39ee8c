/// The families of mode scripts, which differ in how players are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Players are ranked by their best run time.
    TimeAttack,

    /// Rounds, Team and Cup modes: players are ranked by their points
    /// on the current map, which are awarded by finish position in each round.
    RoundBased,

    /// Players are ranked by their progress in a multi-lap race.
    Laps,

    /// Live rankings are not available in this mode.
    Unsupported,
}

impl Mode {
    /// Classify a mode script by its name, f.e. "Trackmania/TM_Rounds_Online.Script.txt".
    ///
    /// A laps variant of any other mode is always classified as `Laps`.
    pub fn from_script(script_name: &str) -> Mode {
        let name = script_name.to_lowercase();
        if name.contains("laps") {
            Mode::Laps
        } else if name.contains("timeattack") {
            Mode::TimeAttack
        } else if ["rounds", "team", "cup"].iter().any(|s| name.contains(s)) {
            Mode::RoundBased
        } else {
            Mode::Unsupported
        }
    }

    /// `True` if players are awarded points by their finish position.
    pub fn uses_points(self) -> bool {
        self == Mode::RoundBased
    }

    /// `True` if players are ranked at every checkpoint.
    pub fn ranks_waypoints(self) -> bool {
        self == Mode::Laps
    }

    pub fn is_supported(self) -> bool {
        self != Mode::Unsupported
    }
}
