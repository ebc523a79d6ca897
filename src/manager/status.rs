use chrono::NaiveDateTime;

use crate::models::{Epic, Status, Subtask};

/// Derives an epic's status from its subtasks' statuses.
///
/// No subtasks, or all `New`, gives `New`. All `Done` gives `Done`. Anything
/// else gives `InProgress`.
pub fn derive_epic_status<I>(statuses: I) -> Status
where
    I: IntoIterator<Item = Status>,
{
    let mut all_new = true;
    let mut all_done = true;

    for status in statuses {
        all_new &= status == Status::New;
        all_done &= status == Status::Done;
        if !all_new && !all_done {
            return Status::InProgress;
        }
    }

    if all_new {
        Status::New
    } else {
        Status::Done
    }
}

/// Rewrites every derived field of `epic` from `subtasks`.
///
/// `subtasks` must be exactly the epic's current subtasks.
pub(crate) fn refresh_epic<'a, I>(epic: &mut Epic, subtasks: I)
where
    I: IntoIterator<Item = &'a Subtask>,
{
    let mut statuses = Vec::new();
    let mut start_time: Option<NaiveDateTime> = None;
    let mut end_time: Option<NaiveDateTime> = None;
    let mut total_minutes = 0i64;

    for subtask in subtasks {
        statuses.push(subtask.status);
        if let Some(start) = subtask.start_time {
            start_time = Some(start_time.map_or(start, |s| s.min(start)));
        }
        if let Some(end) = subtask.end_time() {
            end_time = Some(end_time.map_or(end, |e| e.max(end)));
        }
        total_minutes = total_minutes.saturating_add(subtask.duration_minutes.unwrap_or(0));
    }

    epic.duration_minutes = if statuses.is_empty() {
        None
    } else {
        Some(total_minutes)
    };
    epic.status = derive_epic_status(statuses);
    epic.start_time = start_time;
    epic.end_time = end_time;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EpicInput, SubtaskInput};
    use chrono::NaiveDate;

    use Status::*;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn empty_is_new() {
        assert_eq!(derive_epic_status([]), New);
    }

    #[test]
    fn uniform_statuses_carry_over() {
        assert_eq!(derive_epic_status([New, New, New]), New);
        assert_eq!(derive_epic_status([Done, Done]), Done);
        assert_eq!(derive_epic_status([InProgress]), InProgress);
    }

    #[test]
    fn any_mixture_is_in_progress() {
        assert_eq!(derive_epic_status([New, Done]), InProgress);
        assert_eq!(derive_epic_status([Done, New]), InProgress);
        assert_eq!(derive_epic_status([New, InProgress]), InProgress);
        assert_eq!(derive_epic_status([Done, Done, InProgress]), InProgress);
    }

    #[test]
    fn refresh_derives_time_fields() {
        let mut epic = EpicInput::new("Move house", "").into_epic(1);
        let early = SubtaskInput::new(1, "Pack", "")
            .with_status(Done)
            .scheduled(at(9), 60)
            .into_subtask(2);
        let late = SubtaskInput::new(1, "Drive", "")
            .scheduled(at(13), 120)
            .into_subtask(3);
        let unscheduled = SubtaskInput::new(1, "Call movers", "").into_subtask(4);

        refresh_epic(&mut epic, [&late, &unscheduled, &early]);

        assert_eq!(epic.status, InProgress);
        assert_eq!(epic.start_time, Some(at(9)));
        assert_eq!(epic.end_time, Some(at(15)));
        assert_eq!(epic.duration_minutes, Some(180));
    }

    #[test]
    fn refresh_clears_time_fields_without_subtasks() {
        let mut epic = EpicInput::new("Move house", "").into_epic(1);
        epic.status = Done;
        epic.start_time = Some(at(9));
        epic.duration_minutes = Some(30);
        epic.end_time = Some(at(10));

        refresh_epic(&mut epic, []);

        assert_eq!(epic.status, New);
        assert_eq!(epic.start_time, None);
        assert_eq!(epic.duration_minutes, None);
        assert_eq!(epic.end_time, None);
    }
}
