//! Turns a loaded question into the choice list shown for a round.

use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::config::AnswerSortOrder;
use crate::types::{PresentedQuestion, Question};

/// Merge, order and index the answers of `question`
pub fn prepare_question<R: Rng + ?Sized>(
    question: Question,
    order: AnswerSortOrder,
    rng: &mut R,
) -> PresentedQuestion {
    let mut answers: Vec<String> = question
        .correct_answers
        .iter()
        .chain(question.incorrect_answers.iter())
        .cloned()
        .collect();

    match order {
        AnswerSortOrder::Alphabetical => {
            insertion_sort(&mut answers, |a, b| compare_answers(a, b))
        }
        AnswerSortOrder::Random => answers.shuffle(rng),
    }

    let answers = pin_special_answers(answers);

    // Duplicate texts resolve to the first matching position
    let correct_indices: BTreeSet<usize> = question
        .correct_answers
        .iter()
        .filter_map(|correct| answers.iter().position(|a| a == correct))
        .collect();

    PresentedQuestion {
        question,
        answers,
        correct_indices,
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let cleaned = text.trim().replace(',', "");
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numeric when both sides are numbers, otherwise case-insensitive text
/// with lowercase ahead of uppercase on ties
fn compare_answers(a: &str, b: &str) -> Ordering {
    if let (Some(x), Some(y)) = (parse_number(a), parse_number(b)) {
        if let Some(ordering) = x.partial_cmp(&y) {
            return ordering;
        }
    }
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Stable and panic-free for comparators that mix numeric and text ordering,
/// which are not guaranteed to be total.
fn insertion_sort<T, F>(items: &mut [T], mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && compare(&items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}

fn is_none_of(answer: &str) -> bool {
    answer.to_lowercase().starts_with("none of ")
}

/// Move "none of ..." answers to the end and put "True" ahead of "False".
/// Everything else keeps its relative order.
fn pin_special_answers(answers: Vec<String>) -> Vec<String> {
    let (mut ordered, none_of): (Vec<String>, Vec<String>) =
        answers.into_iter().partition(|a| !is_none_of(a));

    let true_at = ordered.iter().position(|a| a.eq_ignore_ascii_case("true"));
    let false_at = ordered.iter().position(|a| a.eq_ignore_ascii_case("false"));
    if let (Some(t), Some(f)) = (true_at, false_at) {
        if f < t {
            ordered.swap(f, t);
        }
    }

    ordered.extend(none_of);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn question(correct: &[&str], incorrect: &[&str]) -> Question {
        Question {
            question_text: "Q?".to_string(),
            correct_answers: correct.iter().map(|s| s.to_string()).collect(),
            incorrect_answers: incorrect.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn assert_indices_consistent(p: &PresentedQuestion) {
        for (i, answer) in p.answers.iter().enumerate() {
            assert_eq!(
                p.question.correct_answers.contains(answer),
                p.is_correct(i),
                "index {} ({}) disagrees with correct answers",
                i,
                answer
            );
        }
    }

    #[test]
    fn test_alphabetical_text() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = prepare_question(
            question(&["banana"], &["Cherry", "apple", "date"]),
            AnswerSortOrder::Alphabetical,
            &mut rng,
        );
        assert_eq!(p.answers, vec!["apple", "banana", "Cherry", "date"]);
        assert_eq!(p.correct_indices, BTreeSet::from([1]));
    }

    #[test]
    fn test_alphabetical_case_tie_puts_lowercase_first() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = prepare_question(
            question(&["Apple"], &["apple", "banana"]),
            AnswerSortOrder::Alphabetical,
            &mut rng,
        );
        assert_eq!(p.answers, vec!["apple", "Apple", "banana"]);
        assert_eq!(p.correct_indices, BTreeSet::from([1]));
        assert_eq!(compare_answers("apple", "Apple"), Ordering::Less);
    }

    #[test]
    fn test_alphabetical_numeric() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = prepare_question(
            question(&["1,000"], &["200", "30", "4.5"]),
            AnswerSortOrder::Alphabetical,
            &mut rng,
        );
        assert_eq!(p.answers, vec!["4.5", "30", "200", "1,000"]);
        assert_eq!(p.correct_indices, BTreeSet::from([3]));
    }

    #[test]
    fn test_none_of_goes_last_for_any_order() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let p = prepare_question(
                question(&["None of the above"], &["Red", "Green", "Blue"]),
                AnswerSortOrder::Random,
                &mut rng,
            );
            assert_eq!(p.answers.last().unwrap(), "None of the above");
            assert_eq!(p.correct_indices, BTreeSet::from([3]));
            assert_indices_consistent(&p);
        }

        let mut rng = StdRng::seed_from_u64(0);
        let p = prepare_question(
            question(&["Zebra"], &["none of these", "Aardvark"]),
            AnswerSortOrder::Alphabetical,
            &mut rng,
        );
        assert_eq!(p.answers, vec!["Aardvark", "Zebra", "none of these"]);
    }

    #[test]
    fn test_true_before_false() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let p = prepare_question(
                question(&["False"], &["True"]),
                AnswerSortOrder::Random,
                &mut rng,
            );
            assert_eq!(p.answers, vec!["True", "False"]);
            assert_eq!(p.correct_indices, BTreeSet::from([1]));
        }
    }

    #[test]
    fn test_random_keeps_all_answers() {
        let mut rng = StdRng::seed_from_u64(7);
        let p = prepare_question(
            question(&["a", "b"], &["c", "d", "e"]),
            AnswerSortOrder::Random,
            &mut rng,
        );
        let mut sorted = p.answers.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(p.correct_indices.len(), 2);
        assert_indices_consistent(&p);
    }

    #[test]
    fn test_duplicate_text_maps_to_first_match() {
        let mut rng = StdRng::seed_from_u64(0);
        let p = prepare_question(
            question(&["same"], &["same", "other"]),
            AnswerSortOrder::Alphabetical,
            &mut rng,
        );
        assert_eq!(p.answers, vec!["other", "same", "same"]);
        assert_eq!(p.correct_indices, BTreeSet::from([1]));
    }

    #[test]
    fn test_mixed_numeric_and_text_does_not_panic() {
        let mut rng = StdRng::seed_from_u64(0);
        let p = prepare_question(
            question(&["10"], &["9", "ten", "1e3", "NaN"]),
            AnswerSortOrder::Alphabetical,
            &mut rng,
        );
        assert_eq!(p.answers.len(), 5);
        assert_indices_consistent(&p);
    }
}
