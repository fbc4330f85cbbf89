use shared::{Achievement, UserProgress};

struct Rule {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    unlocked: fn(&UserProgress) -> bool,
}

const RULES: [Rule; 4] = [
    Rule {
        id: "first_scan",
        name: "First Scan",
        description: "Complete your first waste scan",
        unlocked: |p| p.total_scans >= 1,
    },
    Rule {
        id: "scanner_pro",
        name: "Scanner Pro",
        description: "Complete 50 waste scans",
        unlocked: |p| p.total_scans >= 50,
    },
    Rule {
        id: "eco_warrior",
        name: "Eco Warrior",
        description: "Earn 1000 eco points",
        unlocked: |p| p.eco_points >= 1000,
    },
    Rule {
        id: "perfect_sorter",
        name: "Perfect Sorter",
        description: "Get 10 correct sorts",
        unlocked: |p| p.correct_sorts >= 10,
    },
];

/// Every achievement in a fixed order, each flagged for `progress`.
pub fn achievements(progress: &UserProgress) -> Vec<Achievement> {
    RULES
        .iter()
        .map(|rule| Achievement {
            id: rule.id.to_string(),
            name: rule.name.to_string(),
            description: rule.description.to_string(),
            unlocked: (rule.unlocked)(progress),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(points: u64, scans: u64, correct: u64) -> UserProgress {
        UserProgress {
            eco_points: points,
            eco_level: "Eco Beginner".to_string(),
            total_scans: scans,
            correct_sorts: correct,
        }
    }

    fn unlocked(progress: &UserProgress) -> Vec<String> {
        achievements(progress)
            .into_iter()
            .filter(|a| a.unlocked)
            .map(|a| a.id)
            .collect()
    }

    #[test]
    fn new_user_has_everything_locked() {
        let list = achievements(&progress(0, 0, 0));
        let ids: Vec<&str> = list.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["first_scan", "scanner_pro", "eco_warrior", "perfect_sorter"]);
        assert!(list.iter().all(|a| !a.unlocked));
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(unlocked(&progress(10, 1, 0)), vec!["first_scan"]);
        assert_eq!(
            unlocked(&progress(1000, 50, 10)),
            vec!["first_scan", "scanner_pro", "eco_warrior", "perfect_sorter"]
        );
        assert_eq!(unlocked(&progress(999, 49, 9)), vec!["first_scan"]);
    }
}
