use anyhow::Result;

use bugtrack::models::NewUser;
use bugtrack::Tracker;

pub fn login(tracker: &Tracker, username: &str, password: &str) -> Result<()> {
    let session = tracker.login(username, password)?;
    println!(
        "Logged in as {} ({})",
        session.user.username,
        session.user.display_name()
    );
    Ok(())
}

pub fn register(tracker: &Tracker, new_user: NewUser) -> Result<()> {
    let session = tracker.register(new_user)?;
    println!(
        "Registered {} (#{}) and logged in",
        session.user.username, session.user.id
    );
    Ok(())
}

pub fn logout(tracker: &Tracker) -> Result<()> {
    tracker.logout()?;
    println!("Logged out.");
    Ok(())
}

pub fn whoami(tracker: &Tracker) -> Result<()> {
    match tracker.current_user()? {
        Some(user) => {
            println!("#{} {} <{}>", user.id, user.username, user.email);
            println!("Name: {}", user.display_name());
        }
        None => println!("Not logged in."),
    }
    Ok(())
}
