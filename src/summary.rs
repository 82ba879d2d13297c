//! Shareable email summary of a coaching session

use crate::state_machine::SessionState;

const NO_GOAL: &str = "Not specified";

/// Stage evaluations that make it into the email, with their fallback text
const SECTIONS: [(&str, u8, &str); 4] = [
    ("Key Problems Identified", 2, "No problems identified yet."),
    ("Root Causes", 3, "Root causes not analyzed yet."),
    ("Proposed Plan", 4, "Plan not developed yet."),
    ("Implementation Strategy", 5, "Implementation strategy not developed yet."),
];

/// Format the session's goal and stage evaluations as an email body
pub fn email_summary(session: &SessionState) -> String {
    let goal = session.goal.as_deref().unwrap_or(NO_GOAL);

    let mut email = format!(
        "Subject: Process Improvement Analysis: {goal}\n\n\
         Dear Team,\n\n\
         I recently conducted a structured analysis of our current process related to: \"{goal}\".\n\
         I'd like to share the findings to help us identify common pain points and collaborate on improvements.\n\n\
         ## Goal\n{goal}\n"
    );

    for (title, stage, fallback) in SECTIONS {
        let text = session.evaluation(stage).unwrap_or(fallback);
        email.push_str(&format!("\n## {title}\n{text}\n"));
    }

    email.push_str(
        "\nI believe addressing these issues could significantly improve our workflow efficiency and reduce frustration.\n\
         I'd appreciate your input on these findings and any additional pain points you've experienced that might not be captured here.\n\n\
         Could you please review and let me know:\n\
         1. Do these findings align with your experience?\n\
         2. Are there additional issues you've encountered?\n\
         3. Do you have any suggestions for the proposed solutions?\n\n\
         Thank you for your time and collaboration.\n\n\
         Regards,\n\
         [Your Name]\n",
    );
    email
}
