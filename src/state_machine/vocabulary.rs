//! Fixed vocabulary the bot understands
//!
//! Every phrase here is stored folded (lower case) and compared against
//! folded input.

/// Registration and change-of-data
pub const CHANGE_REG_INFO: &str = "изменить данные";
pub const LECTURES: &str = "лекции";
pub const SCHEDULE: &str = "расписание";
pub const QUERY: &str = "запрос";
pub const GRAPH: &str = "график";
pub const TEACH: &str = "обучить бота";

/// Menu navigation
pub const OTHER_MATERIALS: &str = "остальные материалы";
pub const SECOND_MENU: &str = "другое";
pub const RETURN_MAIN_MENU: &str = "вернуться в главное меню";

/// Admin command prefixes (note the trailing space)
pub const WHO_ADDED: &str = "who added ";
pub const BAN: &str = "ban ";
pub const UNBAN: &str = "unban ";
pub const DELETE: &str = "delete ";

pub const ADMIN_PREFIXES: [&str; 4] = [WHO_ADDED, BAN, UNBAN, DELETE];

pub const COURSES: [&str; 4] = ["1 курс", "2 курс", "3 курс", "4 курс"];

/// Department code per course, in course order
const GROUP_CODES: [&str; 4] = ["01", "91", "86", "76"];

pub const GROUPS_PER_COURSE: u8 = 5;

pub const DAYS: [&str; 6] = [
    "понедельник",
    "вторник",
    "среда",
    "четверг",
    "пятница",
    "суббота",
];

pub const VAR_COUNTS: [(&str, u8); 2] = [("1 переменная", 1), ("2 переменные", 2)];

pub fn is_course(label: &str) -> bool {
    COURSES.contains(&label)
}

/// Groups belonging to a course label, e.g. "1 курс" -> "б03-0101".."б03-0105"
pub fn groups(course: &str) -> Vec<String> {
    COURSES
        .iter()
        .position(|c| *c == course)
        .map(|i| {
            (1..=GROUPS_PER_COURSE)
                .map(|n| format!("б03-{}{n:02}", GROUP_CODES[i]))
                .collect()
        })
        .unwrap_or_default()
}

pub fn is_group_of(course: &str, group: &str) -> bool {
    groups(course).iter().any(|g| g == group)
}

pub fn is_day(label: &str) -> bool {
    DAYS.contains(&label)
}

pub fn var_count(label: &str) -> Option<u8> {
    VAR_COUNTS
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, n)| *n)
}

/// Accusative form used in the schedule title ("на среду")
pub fn day_accusative(day: &str) -> &str {
    match day {
        "среда" => "среду",
        "пятница" => "пятницу",
        "суббота" => "субботу",
        other => other,
    }
}

/// Menu labels shown on the two persistent keyboards
pub const MAIN_MENU_LABELS: [&str; 5] = [SCHEDULE, LECTURES, QUERY, GRAPH, SECOND_MENU];
pub const OTHER_MENU_LABELS: [&str; 4] = [OTHER_MATERIALS, TEACH, CHANGE_REG_INFO, RETURN_MAIN_MENU];

/// Every built-in trigger phrase; taught answers must not shadow these
pub fn builtin_phrases() -> Vec<String> {
    let mut words: Vec<String> = MAIN_MENU_LABELS
        .iter()
        .chain(OTHER_MENU_LABELS.iter())
        .chain(COURSES.iter())
        .chain(DAYS.iter())
        .map(|s| (*s).to_string())
        .collect();
    words.extend(VAR_COUNTS.iter().map(|(l, _)| (*l).to_string()));
    words.extend(COURSES.iter().flat_map(|c| groups(c)));
    words.extend(ADMIN_PREFIXES.iter().map(|p| p.trim_end().to_string()));
    words
}
