use crate::db::models::{PollOption, PollResults};
use crate::db::repositories::poll_repository;
use crate::error::PollError;
use crate::startup::AppState;
use axum::{
    Json,
    extract::{Extension, Path},
    response::IntoResponse,
};
use uuid::Uuid;

/// Most recently created poll that is both `active` and not past its
/// deadline, with its options in display order; JSON `null` when none
/// qualifies.
pub async fn get_active_poll(
    Extension(app_state): Extension<AppState>,
) -> Result<impl IntoResponse, PollError> {
    let poll = match poll_repository::get_active_poll(&app_state.db).await? {
        Some(mut poll) => {
            poll.options =
                Some(poll_repository::get_poll_options(&app_state.db, poll.id).await?);
            Some(poll)
        }
        None => None,
    };

    Ok(Json(poll))
}

/// Results stay retrievable for closed and expired polls; only a missing
/// poll id is an error.
pub async fn get_poll_results(
    Extension(app_state): Extension<AppState>,
    Path(poll_id): Path<Uuid>,
) -> Result<impl IntoResponse, PollError> {
    let poll = poll_repository::get_poll(&app_state.db, poll_id)
        .await?
        .ok_or(PollError::PollNotFound)?;

    let mut options = poll_repository::get_options_with_counts(&app_state.db, poll_id).await?;
    let total_votes = tally(&mut options);

    Ok(Json(PollResults {
        poll,
        options,
        total_votes,
    }))
}

pub async fn get_history(
    Extension(app_state): Extension<AppState>,
) -> Result<impl IntoResponse, PollError> {
    let mut polls = poll_repository::get_historical_polls(&app_state.db).await?;

    for poll in &mut polls {
        poll.options =
            Some(poll_repository::get_options_with_counts(&app_state.db, poll.id).await?);
    }

    Ok(Json(polls))
}

/// Sums the per-option counts and fills in round-half-up percentages of the
/// total. A poll with no votes reports 0 for every option rather than
/// dividing by zero.
fn tally(options: &mut [PollOption]) -> i64 {
    let total: i64 = options.iter().map(|o| o.vote_count.unwrap_or(0)).sum();

    for option in options.iter_mut() {
        let count = option.vote_count.unwrap_or(0);
        option.percentage = Some(if total > 0 {
            ((count as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        });
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option_with(count: Option<i64>) -> PollOption {
        PollOption {
            id: Uuid::new_v4(),
            poll_id: Uuid::new_v4(),
            option_text: "x".to_string(),
            display_order: 1,
            vote_count: count,
            percentage: None,
        }
    }

    fn tally_counts(counts: &[i64]) -> (i64, Vec<u32>) {
        let mut options: Vec<PollOption> =
            counts.iter().map(|&c| option_with(Some(c))).collect();
        let total = tally(&mut options);
        let percentages = options.iter().map(|o| o.percentage.unwrap()).collect();
        (total, percentages)
    }

    #[test]
    fn zero_votes_means_zero_percent_everywhere() {
        let (total, percentages) = tally_counts(&[0, 0, 0]);

        assert_eq!(total, 0);
        assert_eq!(percentages, vec![0, 0, 0]);
    }

    #[test]
    fn a_single_vote_takes_the_full_hundred() {
        let (total, percentages) = tally_counts(&[1, 0]);

        assert_eq!(total, 1);
        assert_eq!(percentages, vec![100, 0]);
    }

    #[test]
    fn an_even_split_reads_fifty_fifty() {
        let (total, percentages) = tally_counts(&[1, 1]);

        assert_eq!(total, 2);
        assert_eq!(percentages, vec![50, 50]);
    }

    #[test]
    fn thirds_round_down_to_thirty_three() {
        let (total, percentages) = tally_counts(&[1, 1, 1]);

        assert_eq!(total, 3);
        assert_eq!(percentages, vec![33, 33, 33]);
    }

    #[test]
    fn exact_halves_round_up() {
        // 1/8 = 12.5% and 7/8 = 87.5%; both halves go up
        let (total, percentages) = tally_counts(&[1, 7]);

        assert_eq!(total, 8);
        assert_eq!(percentages, vec![13, 88]);
    }

    #[test]
    fn percentages_stay_within_rounding_of_one_hundred() {
        for counts in [&[2, 1][..], &[3, 3, 1][..], &[5, 2, 2][..]] {
            let (_, percentages) = tally_counts(counts);
            let sum: u32 = percentages.iter().sum();
            assert!((99..=101).contains(&sum), "sum was {sum}");
        }
    }

    #[test]
    fn missing_counts_are_treated_as_zero() {
        let mut options = vec![option_with(None), option_with(Some(2))];
        let total = tally(&mut options);

        assert_eq!(total, 2);
        assert_eq!(options[0].percentage, Some(0));
        assert_eq!(options[1].percentage, Some(100));
    }
}
