/// Lowercases and trims a playlist name and collapses inner whitespace runs
/// to a single space.
pub fn normalize(name: &str) -> String {
    name.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_lowercases() {
        assert_eq!(normalize(" Road Trip"), "road trip");
        assert_eq!(normalize("ROAD TRIP  "), "road trip");
    }

    #[test]
    fn collapses_inner_whitespace() {
        assert_eq!(normalize("Road \t  Trip"), "road trip");
    }

    #[test]
    fn lowercases_non_ascii() {
        assert_eq!(normalize("ÉTÉ Hits"), "été hits");
    }

    #[test]
    fn empty_and_blank() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }
}
