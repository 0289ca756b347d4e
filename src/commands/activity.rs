use anyhow::Result;

use bugtrack::models::ActivityFilter;
use bugtrack::Tracker;

pub fn run(tracker: &Tracker, project: Option<i64>, limit: usize) -> Result<()> {
    let activities = tracker.get_activities(ActivityFilter {
        project,
        limit: Some(limit),
    })?;

    if activities.is_empty() {
        println!("No activity yet.");
        return Ok(());
    }

    for activity in activities.results {
        println!(
            "[{}] {} #{}: {}",
            activity.created_at.format("%Y-%m-%d %H:%M"),
            activity.user.username,
            activity.issue,
            activity.description
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_feed() {
        let tracker = Tracker::in_memory();
        assert!(run(&tracker, None, 20).is_ok());
    }

    #[test]
    fn test_feed_after_comment() {
        let tracker = Tracker::in_memory();
        tracker.login("demo", "").unwrap();
        tracker.create_comment(1, "hello").unwrap();
        assert!(run(&tracker, Some(1), 5).is_ok());
        assert_eq!(
            tracker
                .get_activities(ActivityFilter::default())
                .unwrap()
                .len(),
            1
        );
    }
}
