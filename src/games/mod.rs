pub mod memory;
pub mod tictactoe;
pub mod whack;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameId
{
    Memory,
    TicTacToe,
    Whack,
}

pub struct GameDescriptor
{
    pub id: GameId,
    pub name: &'static str,
    pub route: &'static str,
    pub description: &'static str,
}

/// Games in the order the home menu lists them.
pub fn registry() -> Vec<GameDescriptor>
{
    vec![GameDescriptor {
        id: GameId::Memory,
        name: "memory",
        route: "/memoryGame",
        description: "Flip cards two at a time and match every pair",
    },
    GameDescriptor {
        id: GameId::TicTacToe,
        name: "tictactoe",
        route: "/ticTacToe",
        description: "Two players, three in a row",
    },
    GameDescriptor {
        id: GameId::Whack,
        name: "whack",
        route: "/popAballoon",
        description: "Whac a Mole against the clock, best score is saved",
    }]
}

/// Resolves a game by name or by route path (leading slash optional).
pub fn find(choice: &str) -> Option<GameId>
{
    let choice = choice.trim();
    let path = choice.strip_prefix('/').unwrap_or(choice);
    registry()
        .into_iter()
        .find(|game| {
            game.name.eq_ignore_ascii_case(choice)
                || game.route.trim_start_matches('/').eq_ignore_ascii_case(path)
        })
        .map(|game| game.id)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn finds_by_name_and_route()
    {
        assert_eq!(find("memory"), Some(GameId::Memory));
        assert_eq!(find("/memoryGame"), Some(GameId::Memory));
        assert_eq!(find("memorygame"), Some(GameId::Memory));
        assert_eq!(find("/popAballoon"), Some(GameId::Whack));
        assert_eq!(find("WHACK"), Some(GameId::Whack));
        assert_eq!(find(" /ticTacToe "), Some(GameId::TicTacToe));
        assert_eq!(find("/"), None);
        assert_eq!(find("chess"), None);
    }

    #[test]
    fn routes_are_unique()
    {
        let games = registry();
        for (i, a) in games.iter().enumerate() {
            for b in &games[i + 1..] {
                assert_ne!(a.route, b.route);
                assert_ne!(a.name, b.name);
            }
        }
    }
}
