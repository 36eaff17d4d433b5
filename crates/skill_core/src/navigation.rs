use std::{num::NonZeroUsize, ops::RangeInclusive};

use shared::{domain::NavigationCommand, error::SkillError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved(usize),
    Stopped,
}

/// Computes the start index of the next page.
///
/// `next` wraps to the first page once it passes the end of the list, `prev`
/// clamps at zero. `stop` carries no index; the caller ends browsing.
pub fn advance(
    command: NavigationCommand,
    current: usize,
    group_size: NonZeroUsize,
    total: usize,
) -> Result<Step, SkillError> {
    if total == 0 {
        return Err(SkillError::NoResults);
    }
    let group_size = group_size.get();
    let index = match command {
        NavigationCommand::Next => match current.checked_add(group_size) {
            Some(next) if next < total => next,
            _ => 0,
        },
        NavigationCommand::Prev => current.saturating_sub(group_size),
        NavigationCommand::MoveFirst => 0,
        NavigationCommand::Stop => return Ok(Step::Stopped),
    };
    Ok(Step::Moved(index))
}

/// The slice of a list shown on one page. Indexes are zero based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationWindow {
    pub start_index: usize,
    pub end_index: usize,
    pub total: usize,
}

impl NavigationWindow {
    pub fn compute(
        start_index: usize,
        group_size: NonZeroUsize,
        total: usize,
    ) -> Result<Self, SkillError> {
        if total == 0 {
            return Err(SkillError::NoResults);
        }
        if start_index >= total {
            return Err(SkillError::StaleIndex { start_index, total });
        }
        let end_index = start_index
            .saturating_add(group_size.get() - 1)
            .min(total - 1);
        Ok(Self {
            start_index,
            end_index,
            total,
        })
    }

    pub fn first(group_size: NonZeroUsize, total: usize) -> Result<Self, SkillError> {
        Self::compute(0, group_size, total)
    }

    pub fn range(&self) -> RangeInclusive<usize> {
        self.start_index..=self.end_index
    }

    pub fn page_len(&self) -> usize {
        self.end_index - self.start_index + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn five() -> NonZeroUsize {
        NonZeroUsize::new(5).expect("non-zero")
    }

    #[test]
    fn next_moves_by_group_size() {
        let step = advance(NavigationCommand::Next, 0, five(), 12).expect("step");
        assert_eq!(step, Step::Moved(5));
    }

    #[test]
    fn next_wraps_past_the_end() {
        assert_eq!(
            advance(NavigationCommand::Next, 10, five(), 12).expect("step"),
            Step::Moved(0)
        );
        assert_eq!(
            advance(NavigationCommand::Next, 5, five(), 10).expect("step"),
            Step::Moved(0)
        );
    }

    #[test]
    fn prev_clamps_at_zero() {
        assert_eq!(
            advance(NavigationCommand::Prev, 0, five(), 12).expect("step"),
            Step::Moved(0)
        );
        assert_eq!(
            advance(NavigationCommand::Prev, 3, five(), 12).expect("step"),
            Step::Moved(0)
        );
        assert_eq!(
            advance(NavigationCommand::Prev, 10, five(), 12).expect("step"),
            Step::Moved(5)
        );
    }

    #[test]
    fn move_first_and_stop() {
        assert_eq!(
            advance(NavigationCommand::MoveFirst, 10, five(), 12).expect("step"),
            Step::Moved(0)
        );
        assert_eq!(
            advance(NavigationCommand::Stop, 10, five(), 12).expect("step"),
            Step::Stopped
        );
    }

    #[test]
    fn empty_list_has_no_results() {
        let err = advance(NavigationCommand::Next, 0, five(), 0).expect_err("empty");
        assert!(matches!(err, SkillError::NoResults));
    }

    #[test]
    fn window_clips_to_list_end() {
        let window = NavigationWindow::compute(5, five(), 7).expect("window");
        assert_eq!(window.range(), 5..=6);
        assert_eq!(window.total, 7);
        assert_eq!(window.page_len(), 2);
    }

    #[test]
    fn window_rejects_stale_start() {
        let err = NavigationWindow::compute(50, five(), 7).expect_err("stale");
        assert!(matches!(
            err,
            SkillError::StaleIndex {
                start_index: 50,
                total: 7
            }
        ));
    }

    proptest! {
        #[test]
        fn repeated_next_returns_to_start(total in 1usize..200, group in 1usize..20) {
            let group_size = NonZeroUsize::new(group).expect("non-zero");
            let mut index = 0;
            let pages = total.div_ceil(group);
            for step in 1..=pages {
                match advance(NavigationCommand::Next, index, group_size, total).expect("step") {
                    Step::Moved(next) => index = next,
                    Step::Stopped => unreachable!(),
                }
                if step < pages {
                    prop_assert!(index > 0 && index < total);
                }
            }
            prop_assert_eq!(index, 0);
        }

        #[test]
        fn window_always_fits(start in 0usize..100, total in 1usize..100, group in 1usize..20) {
            let group_size = NonZeroUsize::new(group).expect("non-zero");
            match NavigationWindow::compute(start, group_size, total) {
                Ok(window) => {
                    prop_assert!(window.end_index < total);
                    prop_assert!(window.page_len() <= group);
                }
                Err(SkillError::StaleIndex { .. }) => prop_assert!(start >= total),
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
        }
    }
}
