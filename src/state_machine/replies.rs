//! Reply wording

// registration
pub const CHOOSE_COURSE_GREETING: &str =
    "Приветствую! Для продолжения пройдите краткую регистрацию\nВыберите курс";
pub const CHOOSE_COURSE_CHANGING: &str = "Для продолжения пройдите краткую регистрацию\nВыберите курс";
pub const CHOOSE_COURSE_TO_CONTINUE: &str = "Для продолжения выберите курс";
pub const CHOOSE_GROUP: &str = "Выберите группу";
pub const CHOOSE_GROUP_TO_CONTINUE: &str = "Для продолжения выберите группу";
pub const REG_FINISH: &str =
    "Вы успешно прошли регистрацию. Для изменения данных введите \"Изменить данные\"";

// admin: who added
pub const ANSWER_NOT_SET: &str = "Ответ на это сообщение не установлен";
pub const UNKNOWN_NAME: &str = "неизвестно";

pub fn teacher_info(name: &str, surname: &str, owner: &str, answer: &str) -> String {
    format!("Имя: {name}\nФамилия: {surname}\nid: {owner}\nУстановленный ответ на сообщение: {answer}")
}

// links
pub const CHOOSE_SUBJECT: &str = "Выберите предмет:";
pub const LINKS_FAILED: &str = "Произошла ошибка на сервере, ссылки недоступны";

// schedule
pub const CHOOSE_DAY: &str = "Выберите день недели:";
pub const SCHEDULE_FAILED: &str = "Произошла ошибка на сервере, расписание недоступно";
pub const NO_CLASS: &str = "Нет пары";
pub const CELL_ERROR: &str = "Error";

// admin: delete
pub fn custom_deleted(phrase: &str) -> String {
    format!("Ответ на сообщение \"{phrase}\" удален")
}

// menu
pub const OTHER_FUNC: &str = "Другие функции бота:";
pub const MAIN_MENU: &str = "Главное меню:";

// query
pub const INPUT_QUERY: &str = "Введите текст запроса (запрос нужно писать на английском)";
pub const QUERY_FAILED: &str = "Я не смог обработать этот запрос";

// graph
pub const CHOOSE_VAR_NUM: &str = "Выберите количество переменных:";
pub const INPUT_FUNC: &str = "Введите функцию, график которой надо построить";
pub const WRONG_VAR_NUM: &str = "Неверное количество переменных";
pub const GRAPH_FAILED: &str = "Я не смог построить этот график";

pub fn graph_finish(expression: &str) -> String {
    format!("График функции {expression}:")
}

// admin: ban / unban
pub const BANNED: &str = "Пользователь забанен";
pub const BAN_USAGE: &str = "Формат команды: ban <id> <причина>";
pub const UNBAN_USAGE: &str = "Формат команды: unban <id>";
pub const UNBANNED: &str = "Пользователь разбанен";
pub const WAS_NOT_BANNED: &str = "Пользователь не был забанен";
pub const ACCESS_RESTRICTED: &str = "Администрация временно ограничила ваше право пользования ботом";

// teach-bot
pub const CUSTOM_TO_ANSWER: &str = "Напишите фразу, на которую бот будет отвечать: ";
pub const CUSTOM_FILTER_REJECT: &str = "Нельзя обучать бота мату";
pub const CUSTOM_RESERVED_REJECT: &str = "Эта фраза зарезервирована";
pub const CUSTOM_TAUGHT_REJECT: &str = "Этой фразе бот уже обучен";
pub const CUSTOM_ANSWER: &str = "Напишите фразу, которой бот будет отвечать на введённую вами ранее";
pub const CUSTOM_FINISH: &str = "Вы успешно обучили бота";
pub const FILTER_FAILED: &str = "Не удалось проверить фразу, попробуйте позже";
