use anyhow::Result;

use bugtrack::Tracker;

pub fn run(tracker: &Tracker, search: Option<&str>) -> Result<()> {
    let users = match search {
        Some(query) => tracker.search_users(query)?,
        None => tracker.get_users()?,
    };

    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    for user in users.results {
        println!(
            "#{:<14} {:<16} {:<28} {}",
            user.id,
            user.username,
            user.email,
            user.display_name()
        );
    }
    Ok(())
}
