//! Word lists and acronym expansion for the `.acr` command.

use std::path::{Path, PathBuf};

use rand::Rng;
use rand::seq::IndexedRandom;
use thiserror::Error;
use tracing::debug;

const LETTERS: usize = 26;

/// Above this many letters every word is drawn from the combined list.
const MAX_PHRASE_LETTERS: usize = 16;

#[derive(Debug, Error)]
pub enum WordListError {
    #[error("failed to read word list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Words bucketed by their first letter, `a` through `z`.
#[derive(Debug, Clone)]
struct ByLetter(Vec<Vec<String>>);

impl Default for ByLetter {
    fn default() -> Self {
        Self(vec![Vec::new(); LETTERS])
    }
}

impl ByLetter {
    /// Bucket one word per line. Lines that are empty or do not start with
    /// an ASCII letter are skipped.
    fn parse(text: &str) -> Self {
        let mut lists = Self::default();
        for word in text.lines().map(str::trim) {
            if let Some(idx) = word.chars().next().and_then(letter_index) {
                lists.0[idx].push(word.to_lowercase());
            }
        }
        lists
    }

    fn get(&self, letter: char) -> &[String] {
        letter_index(letter).map_or(&[], |idx| self.0[idx].as_slice())
    }

    fn total(&self) -> usize {
        self.0.iter().map(Vec::len).sum()
    }
}

fn letter_index(letter: char) -> Option<usize> {
    let lower = letter.to_ascii_lowercase();
    lower
        .is_ascii_lowercase()
        .then(|| (lower as u8 - b'a') as usize)
}

/// The four part-of-speech lists plus their per-letter union.
#[derive(Debug, Clone, Default)]
pub struct WordLists {
    nouns: ByLetter,
    verbs: ByLetter,
    adverbs: ByLetter,
    adjectives: ByLetter,
    all: ByLetter,
}

impl WordLists {
    /// Read `nouns.txt`, `verbs.txt`, `adverbs.txt` and `adjectives.txt`
    /// from `dir`.
    pub async fn load(dir: impl AsRef<Path>) -> Result<Self, WordListError> {
        let dir = dir.as_ref();
        let (nouns, verbs, adverbs, adjectives) = tokio::try_join!(
            read_list(dir, "nouns.txt"),
            read_list(dir, "verbs.txt"),
            read_list(dir, "adverbs.txt"),
            read_list(dir, "adjectives.txt"),
        )?;
        let lists = Self::from_texts(&nouns, &verbs, &adverbs, &adjectives);
        debug!(dir = %dir.display(), words = lists.all.total(), "loaded word lists");
        Ok(lists)
    }

    /// Build lists from newline-separated word texts.
    #[must_use]
    pub fn from_texts(nouns: &str, verbs: &str, adverbs: &str, adjectives: &str) -> Self {
        let nouns = ByLetter::parse(nouns);
        let verbs = ByLetter::parse(verbs);
        let adverbs = ByLetter::parse(adverbs);
        let adjectives = ByLetter::parse(adjectives);

        let mut all = ByLetter::default();
        for (idx, bucket) in all.0.iter_mut().enumerate() {
            for list in [&nouns, &verbs, &adverbs, &adjectives] {
                bucket.extend(list.0[idx].iter().cloned());
            }
        }

        Self {
            nouns,
            verbs,
            adverbs,
            adjectives,
            all,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.all.total() == 0
    }

    /// One word per letter of `letters` (lowercase ASCII).
    ///
    /// A quarter of the time, or when there are more than 16 letters, words
    /// come from any list. Otherwise the phrase reads as adjectives followed
    /// by a noun, then optionally a verb and an adverb. A letter with no
    /// words stands for itself.
    pub fn acronym<R: Rng + ?Sized>(&self, letters: &str, rng: &mut R) -> Vec<String> {
        let letters: Vec<char> = letters.chars().collect();
        if letters.is_empty() {
            return Vec::new();
        }

        if letters.len() > MAX_PHRASE_LETTERS || letters.len() == 1 || rng.random_ratio(1, 4) {
            return letters
                .iter()
                .map(|&l| pick(&self.all, l, rng))
                .collect();
        }

        let with_verb = rng.random_bool(0.5);
        // Two letters leave no room for an adverb after the verb.
        let with_adverb = with_verb && letters.len() > 2 && rng.random_bool(0.5);
        self.phrase(&letters, with_verb, with_adverb, rng)
    }

    /// Adjectives, a noun, then the optional verb and adverb.
    fn phrase<R: Rng + ?Sized>(
        &self,
        letters: &[char],
        with_verb: bool,
        with_adverb: bool,
        rng: &mut R,
    ) -> Vec<String> {
        let tail = 1 + usize::from(with_verb) + usize::from(with_adverb);
        let (head, rest) = letters.split_at(letters.len() - tail);

        let mut words: Vec<String> = head
            .iter()
            .map(|&l| pick(&self.adjectives, l, rng))
            .collect();
        words.push(pick(&self.nouns, rest[0], rng));
        if with_verb {
            words.push(pick(&self.verbs, rest[1], rng));
        }
        if with_adverb {
            words.push(pick(&self.adverbs, rest[2], rng));
        }
        words
    }
}

fn pick<R: Rng + ?Sized>(list: &ByLetter, letter: char, rng: &mut R) -> String {
    list.get(letter)
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| letter.to_string())
}

async fn read_list(dir: &Path, name: &str) -> Result<String, WordListError> {
    let path = dir.join(name);
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| WordListError::Io { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::TempDir;

    fn sample() -> WordLists {
        WordLists::from_texts(
            "apple\nbanana\ncat\n",
            "accept\nbake\ncarry\n",
            "angrily\nboldly\ncalmly\n",
            "agile\nbrave\ncool\n",
        )
    }

    fn starts_with_letters(words: &[String], letters: &str) -> bool {
        words.len() == letters.len()
            && words
                .iter()
                .zip(letters.chars())
                .all(|(w, l)| w.starts_with(l))
    }

    #[test]
    fn parse_buckets_by_first_letter() {
        let lists = ByLetter::parse("Apple\n\n  axe \nzebra\n42\n");
        assert_eq!(lists.get('a'), ["apple", "axe"]);
        assert_eq!(lists.get('z'), ["zebra"]);
        assert!(lists.get('b').is_empty());
        assert_eq!(lists.total(), 3);
    }

    #[test]
    fn union_holds_every_part_of_speech() {
        let lists = sample();
        assert_eq!(lists.all.get('b'), ["banana", "bake", "boldly", "brave"]);
    }

    #[test]
    fn acronym_has_one_word_per_letter() {
        let lists = sample();
        let mut rng = StdRng::seed_from_u64(7);
        for letters in ["a", "ab", "abc", "cab", "abcabc", "abcabcabcabcabcabc"] {
            for _ in 0..50 {
                let words = lists.acronym(letters, &mut rng);
                assert!(starts_with_letters(&words, letters), "{letters}: {words:?}");
            }
        }
    }

    #[test]
    fn phrase_reads_adjectives_noun_verb_adverb() {
        let lists = sample();
        let mut rng = StdRng::seed_from_u64(11);
        let letters: Vec<char> = "abcab".chars().collect();

        let words = lists.phrase(&letters, true, true, &mut rng);
        assert_eq!(words, ["agile", "brave", "cat", "accept", "boldly"]);

        let words = lists.phrase(&letters, false, false, &mut rng);
        assert_eq!(words, ["agile", "brave", "cool", "agile", "banana"]);
    }

    #[test]
    fn long_input_uses_the_union() {
        let lists = sample();
        let mut rng = StdRng::seed_from_u64(3);
        let letters = "abcabcabcabcabcabc";
        let words = lists.acronym(letters, &mut rng);
        assert!(starts_with_letters(&words, letters));
    }

    #[test]
    fn missing_letter_stands_for_itself() {
        let lists = sample();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(lists.acronym("q", &mut rng), vec!["q"]);

        let empty = WordLists::default();
        assert!(empty.is_empty());
        assert_eq!(empty.acronym("xyz", &mut rng), vec!["x", "y", "z"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample().acronym("", &mut rng).is_empty());
    }

    #[tokio::test]
    async fn test_load_reads_all_four_lists() {
        let dir = TempDir::new().unwrap();
        for (name, text) in [
            ("nouns.txt", "duck\n"),
            ("verbs.txt", "dance\n"),
            ("adverbs.txt", "daily\n"),
            ("adjectives.txt", "dark\n"),
        ] {
            std::fs::write(dir.path().join(name), text).unwrap();
        }

        let lists = WordLists::load(dir.path()).await.unwrap();
        assert_eq!(lists.all.get('d'), ["duck", "dance", "daily", "dark"]);
    }

    #[tokio::test]
    async fn test_load_missing_file_names_the_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("nouns.txt"), "duck\n").unwrap();

        let err = WordLists::load(dir.path()).await.unwrap_err();
        let WordListError::Io { path, .. } = &err;
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(["verbs.txt", "adverbs.txt", "adjectives.txt"].contains(&name));
        assert!(err.to_string().starts_with("failed to read word list"));
    }

    #[tokio::test]
    async fn bundled_lists_cover_the_alphabet() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("static");
        let lists = WordLists::load(dir).await.unwrap();
        for letter in 'a'..='z' {
            assert!(!lists.all.get(letter).is_empty(), "no words for {letter}");
        }
    }
}
