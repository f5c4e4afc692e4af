//! Static recruit roster

use std::fmt;

use serde::Serialize;

/// A recruit the coach can chat with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Player {
    pub id: &'static str,
    pub name: &'static str,
    pub position: &'static str,
    pub school: &'static str,
    pub class_year: u16,
    pub rating: u8,
}

pub const PLAYERS: &[Player] = &[
    Player {
        id: "mendoza",
        name: "Fernando Mendoza",
        position: "QB",
        school: "California",
        class_year: 2026,
        rating: 92,
    },
    Player {
        id: "bain",
        name: "Rueben Bain",
        position: "EDGE",
        school: "Miami",
        class_year: 2026,
        rating: 90,
    },
    Player {
        id: "moore",
        name: "Dante Moore",
        position: "QB",
        school: "UCLA",
        class_year: 2026,
        rating: 91,
    },
    Player {
        id: "sellers",
        name: "LaNorris Sellers",
        position: "QB",
        school: "South Carolina",
        class_year: 2026,
        rating: 88,
    },
    Player {
        id: "jordan",
        name: "A. Jordan",
        position: "WR",
        school: "Oregon",
        class_year: 2026,
        rating: 86,
    },
    Player {
        id: "tucker",
        name: "T. Tucker",
        position: "RB",
        school: "Boise State",
        class_year: 2026,
        rating: 84,
    },
];

pub fn find(id: &str) -> Option<&'static Player> {
    PLAYERS.iter().find(|p| p.id == id)
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} • {} | {} • Class of {} • Rating {}",
            self.name, self.position, self.school, self.class_year, self.rating
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find() {
        let player = find("bain").unwrap();
        assert_eq!(player.name, "Rueben Bain");
        assert_eq!(player.position, "EDGE");
        assert!(find("nobody").is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<_> = PLAYERS.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), PLAYERS.len());
    }

    #[test]
    fn test_display() {
        let line = find("tucker").unwrap().to_string();
        assert_eq!(line, "T. Tucker • RB | Boise State • Class of 2026 • Rating 84");
    }
}
