// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound renderer.
//!
//! A pure mapping from a [`Screen`] to an [`OutboundMessage`]: an image key
//! resolved by the transport's asset catalog, a caption and an inline
//! keyboard. No I/O happens here; the dispatcher loads whatever a screen
//! needs before rendering it.

use chrono::{Days, NaiveDate};
use plantcare_core::domain::{ALLOWED_INTERVALS, compute_next_watering};
use plantcare_core::types::{
    Button, ButtonKind, Group, Keyboard, Media, OutboundMessage, Plant, StagedGroup, StagedPlant,
};

/// Number of quick-pick dates offered for the last watering, today included.
pub const QUICK_PICK_DAYS: u64 = 7;

const INTERVALS_PER_ROW: usize = 4;

/// Longest caption the transport accepts on a photo, in characters.
pub const MAX_CAPTION_CHARS: usize = 1024;

/// Everything the bot can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Menu { has_groups: bool, has_plants: bool },
    Help,
    /// Shown when the wizard buffer is gone; asks the user to `/start` again.
    SessionExpired,
    Groups { groups: Vec<Group> },

    GroupTitle { current: Option<String> },
    GroupDescription { current: Option<String> },
    LastWatering { today: NaiveDate },
    Interval { current: Option<u32> },
    GroupSummary { group: StagedGroup },
    GroupCard { group: StagedGroup },
    GroupChange { group: StagedGroup },
    GroupRemoval { group: StagedGroup, plant_count: u32 },
    GroupPlants { group: StagedGroup, plants: Vec<Plant> },

    PlantTitle { current: Option<String> },
    PlantDescription { current: Option<String> },
    PlantGroup { groups: Vec<Group> },
    PhotoQuestion,
    PlantPhoto,
    PlantSummary { plant: StagedPlant, group_title: String },
    PlantGroups { groups: Vec<Group> },
    PlantList { group: Group, plants: Vec<Plant> },
    PlantCard { plant: StagedPlant, group_title: String },
    PlantChange { plant: StagedPlant },
    PlantRemoval { plant: StagedPlant },

    /// The scheduled watering reminder.
    Reminder { group: Group, plants: Vec<Plant> },
}

/// Russian plural form of "day" for `n`.
pub fn pluralize_days(n: u32) -> &'static str {
    let last_two = n % 100;
    let last = n % 10;
    if last == 1 && last_two != 11 {
        "день"
    } else if (2..=4).contains(&last) && !(12..=14).contains(&last_two) {
        "дня"
    } else {
        "дней"
    }
}

/// Display form of a date, `DD.MM.YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

fn days(n: u32) -> String {
    format!("{n} {}", pluralize_days(n))
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("—")
}

fn back_row() -> Vec<Button> {
    vec![Button::new("⬅️ Назад", ButtonKind::Back)]
}

fn back_and_menu_row() -> Vec<Button> {
    vec![
        Button::new("⬅️ Назад", ButtonKind::Back),
        Button::new("🏠 В меню", ButtonKind::Menu),
    ]
}

/// Today plus the previous days, newest first, as `date:YYYY-MM-DD` buttons.
pub fn date_keyboard(today: NaiveDate) -> Keyboard {
    let buttons: Vec<Button> = (0..QUICK_PICK_DAYS)
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .enumerate()
        .map(|(i, date)| {
            let label = match i {
                0 => "Сегодня".to_string(),
                1 => "Вчера".to_string(),
                _ => date.format("%d.%m").to_string(),
            };
            Button::with_data(label, ButtonKind::Date, date.format("%Y-%m-%d"))
        })
        .collect();

    let mut keyboard = Keyboard::new();
    let mut rest = buttons.into_iter();
    keyboard = keyboard.row(rest.by_ref().take(2).collect());
    keyboard = keyboard.row(rest.by_ref().take(5).collect());
    keyboard.row(back_row())
}

/// The allowed intervals as `interval:<n>` buttons.
pub fn interval_keyboard() -> Keyboard {
    let mut keyboard = Keyboard::new();
    for chunk in ALLOWED_INTERVALS.chunks(INTERVALS_PER_ROW) {
        keyboard = keyboard.row(
            chunk
                .iter()
                .map(|n| Button::with_data(n.to_string(), ButtonKind::Interval, n))
                .collect(),
        );
    }
    keyboard.row(back_row())
}

fn group_buttons(groups: &[Group], kind: ButtonKind) -> Keyboard {
    groups.iter().fold(Keyboard::new(), |kb, g| {
        kb.row(vec![Button::with_data(g.title.clone(), kind, g.id)])
    })
}

fn plant_buttons(plants: &[Plant]) -> Keyboard {
    plants.iter().fold(Keyboard::new(), |kb, p| {
        kb.row(vec![Button::with_data(
            p.title.clone(),
            ButtonKind::ChoosePlant,
            p.id,
        )])
    })
}

fn staged_group_details(group: &StagedGroup) -> String {
    let mut text = format!(
        "🪴 {}\n📝 {}",
        or_dash(group.title.as_deref()),
        or_dash(group.description.as_deref())
    );
    if let Some(last) = group.last_watering_date {
        text.push_str(&format!("\n💧 Последний полив: {}", format_date(last)));
    }
    if let Some(interval) = group.watering_interval {
        text.push_str(&format!("\n🔁 Интервал: {}", days(interval)));
    }
    if let (Some(last), Some(interval)) = (group.last_watering_date, group.watering_interval) {
        text.push_str(&format!(
            "\n📅 Следующий полив: {}",
            format_date(compute_next_watering(last, interval))
        ));
    }
    text
}

fn staged_plant_details(plant: &StagedPlant) -> String {
    format!(
        "🌿 {}\n📝 {}",
        or_dash(plant.title.as_deref()),
        or_dash(plant.description.as_deref())
    )
}

fn plant_media(plant: &StagedPlant) -> Media {
    match &plant.photo {
        Some(bytes) => Media::Photo(bytes.clone()),
        None => Media::Asset("plant"),
    }
}

fn current_value(caption: &str, current: Option<&str>) -> String {
    match current {
        Some(value) => format!("{caption}\n\nСейчас: {value}"),
        None => caption.to_string(),
    }
}

/// Renders `screen` for `chat_id`. A `notice` is placed above the caption.
pub fn render(screen: &Screen, chat_id: i64, notice: Option<&str>) -> OutboundMessage {
    let (media, caption, keyboard) = match screen {
        Screen::Menu {
            has_groups,
            has_plants,
        } => {
            let mut kb = Keyboard::new().row(vec![Button::new(
                "Создать сценарий",
                ButtonKind::CreateGroup,
            )]);
            if *has_groups {
                kb = kb
                    .row(vec![Button::new("Мои сценарии", ButtonKind::MyGroups)])
                    .row(vec![Button::new("Добавить растение", ButtonKind::CreatePlant)]);
            }
            if *has_plants {
                kb = kb.row(vec![Button::new("Мои растения", ButtonKind::MyPlants)]);
            }
            let caption = if *has_groups {
                "Главное меню. Выберите действие."
            } else {
                "Привет! Я напомню, когда пора поливать растения.\n\n\
                 Начните со сценария полива: он задаёт, как часто поливать группу растений."
            };
            (Media::Asset("menu"), caption.to_string(), kb)
        }
        Screen::Help => (
            Media::Asset("help"),
            "Сценарий полива объединяет растения с общим графиком. \
             В день полива я пришлю напоминание, а кнопка «Полито» сдвинет график.\n\n\
             /start — главное меню\n/help — эта справка"
                .to_string(),
            Keyboard::new().row(vec![Button::new("🏠 В меню", ButtonKind::Menu)]),
        ),
        Screen::SessionExpired => (
            Media::None,
            "Сессия устарела. Отправьте /start, чтобы начать заново.".to_string(),
            Keyboard::new(),
        ),
        Screen::Groups { groups } => (
            Media::Asset("groups"),
            if groups.is_empty() {
                "У вас пока нет сценариев.".to_string()
            } else {
                "Ваши сценарии полива:".to_string()
            },
            group_buttons(groups, ButtonKind::ChooseGroup).row(back_row()),
        ),

        Screen::GroupTitle { current } => (
            Media::Asset("group"),
            current_value("Введите название сценария.", current.as_deref()),
            Keyboard::new().row(back_row()),
        ),
        Screen::GroupDescription { current } => (
            Media::Asset("group"),
            current_value("Добавьте описание сценария.", current.as_deref()),
            Keyboard::new()
                .row(vec![Button::new("Пропустить", ButtonKind::SkipDescription)])
                .row(back_row()),
        ),
        Screen::LastWatering { today } => (
            Media::Asset("calendar"),
            format!(
                "Когда был последний полив?\n\nВыберите дату или отправьте её в формате ДД.ММ.ГГГГ, \
                 например {}.",
                format_date(*today)
            ),
            date_keyboard(*today),
        ),
        Screen::Interval { current } => (
            Media::Asset("interval"),
            match current {
                Some(n) => format!("Как часто поливать? Сейчас: раз в {}.", days(*n)),
                None => "Как часто поливать? Выберите интервал в днях.".to_string(),
            },
            interval_keyboard(),
        ),
        Screen::GroupSummary { group } => (
            Media::Asset("group"),
            format!("Проверьте сценарий:\n\n{}", staged_group_details(group)),
            Keyboard::new()
                .row(vec![Button::new("✅ Подтвердить", ButtonKind::Confirm)])
                .row(back_and_menu_row()),
        ),
        Screen::GroupCard { group } => (
            Media::Asset("group"),
            staged_group_details(group),
            Keyboard::new()
                .row(vec![
                    Button::new("Изменить", ButtonKind::ChangeGroup),
                    Button::new("Удалить", ButtonKind::DeleteGroup),
                ])
                .row(vec![Button::new("Растения", ButtonKind::SeePlants)])
                .row(back_and_menu_row()),
        ),
        Screen::GroupChange { group } => (
            Media::Asset("group"),
            format!("Что изменить?\n\n{}", staged_group_details(group)),
            Keyboard::new()
                .row(vec![
                    Button::new("Название", ButtonKind::EditTitle),
                    Button::new("Описание", ButtonKind::EditDescription),
                ])
                .row(vec![
                    Button::new("Последний полив", ButtonKind::EditLastWatering),
                    Button::new("Интервал", ButtonKind::EditInterval),
                ])
                .row(back_row()),
        ),
        Screen::GroupRemoval { group, plant_count } => (
            Media::Asset("group"),
            format!(
                "Удалить сценарий «{}»? Вместе с ним будут удалены растения: {plant_count}.",
                or_dash(group.title.as_deref())
            ),
            Keyboard::new()
                .row(vec![Button::new("Да, удалить", ButtonKind::ConfirmRemoval)])
                .row(back_row()),
        ),
        Screen::GroupPlants { group, plants } => (
            Media::Asset("plants"),
            if plants.is_empty() {
                format!("В сценарии «{}» пока нет растений.", or_dash(group.title.as_deref()))
            } else {
                format!("Растения сценария «{}»:", or_dash(group.title.as_deref()))
            },
            plant_buttons(plants).row(back_and_menu_row()),
        ),

        Screen::PlantTitle { current } => (
            Media::Asset("plant"),
            current_value("Введите название растения.", current.as_deref()),
            Keyboard::new().row(back_row()),
        ),
        Screen::PlantDescription { current } => (
            Media::Asset("plant"),
            current_value("Добавьте описание растения.", current.as_deref()),
            Keyboard::new()
                .row(vec![Button::new("Пропустить", ButtonKind::SkipDescription)])
                .row(back_row()),
        ),
        Screen::PlantGroup { groups } => (
            Media::Asset("groups"),
            "Выберите сценарий полива для растения.".to_string(),
            group_buttons(groups, ButtonKind::ChooseGroup).row(back_row()),
        ),
        Screen::PhotoQuestion => (
            Media::Asset("plant"),
            "Добавить фото растения?".to_string(),
            Keyboard::new()
                .row(vec![
                    Button::new("Да", ButtonKind::PhotoYes),
                    Button::new("Нет", ButtonKind::PhotoNo),
                ])
                .row(back_row()),
        ),
        Screen::PlantPhoto => (
            Media::Asset("plant"),
            "Отправьте фото растения.".to_string(),
            Keyboard::new().row(back_row()),
        ),
        Screen::PlantSummary { plant, group_title } => (
            plant_media(plant),
            format!(
                "Проверьте растение:\n\n{}\n🪴 Сценарий: {group_title}",
                staged_plant_details(plant)
            ),
            Keyboard::new()
                .row(vec![Button::new("✅ Подтвердить", ButtonKind::Confirm)])
                .row(back_and_menu_row()),
        ),
        Screen::PlantGroups { groups } => (
            Media::Asset("plants"),
            "Выберите сценарий, чтобы увидеть его растения.".to_string(),
            group_buttons(groups, ButtonKind::ChooseGroup).row(back_row()),
        ),
        Screen::PlantList { group, plants } => (
            Media::Asset("plants"),
            if plants.is_empty() {
                format!("В сценарии «{}» пока нет растений.", group.title)
            } else {
                format!("Растения сценария «{}»:", group.title)
            },
            plant_buttons(plants).row(back_and_menu_row()),
        ),
        Screen::PlantCard { plant, group_title } => (
            plant_media(plant),
            format!("{}\n🪴 Сценарий: {group_title}", staged_plant_details(plant)),
            Keyboard::new()
                .row(vec![
                    Button::new("Изменить", ButtonKind::ChangePlant),
                    Button::new("Удалить", ButtonKind::DeletePlant),
                ])
                .row(back_and_menu_row()),
        ),
        Screen::PlantChange { plant } => (
            plant_media(plant),
            format!("Что изменить?\n\n{}", staged_plant_details(plant)),
            Keyboard::new()
                .row(vec![
                    Button::new("Название", ButtonKind::EditTitle),
                    Button::new("Описание", ButtonKind::EditDescription),
                ])
                .row(vec![
                    Button::new("Сценарий", ButtonKind::EditGroup),
                    Button::new("Фото", ButtonKind::EditPhoto),
                ])
                .row(back_row()),
        ),
        Screen::PlantRemoval { plant } => (
            plant_media(plant),
            format!("Удалить растение «{}»?", or_dash(plant.title.as_deref())),
            Keyboard::new()
                .row(vec![Button::new("Да, удалить", ButtonKind::ConfirmRemoval)])
                .row(back_row()),
        ),

        Screen::Reminder { group, plants } => (
            Media::Asset("reminder"),
            reminder_caption(group, plants),
            Keyboard::new().row(vec![Button::with_data(
                "Полито 💧",
                ButtonKind::Watered,
                group.id,
            )]),
        ),
    };

    let caption = match notice {
        Some(notice) => format!("{notice}\n\n{caption}"),
        None => caption,
    };

    OutboundMessage {
        chat_id,
        media,
        caption,
        keyboard,
    }
}

/// Reminder text with as many plant names as fit under
/// [`MAX_CAPTION_CHARS`]; the rest are summarized in a closing line.
fn reminder_caption(group: &Group, plants: &[Plant]) -> String {
    let mut caption = format!(
        "💧 Пора полить растения сценария «{}»!\n\n📝 {}\n💧 Последний полив: {}\n🔁 Интервал: {}",
        group.title,
        group.description,
        format_date(group.last_watering_date),
        days(group.watering_interval),
    );
    if !plants.is_empty() {
        caption.push_str("\n\nРастения:");
        let mut used = caption.chars().count();
        for (i, plant) in plants.iter().enumerate() {
            let line = format!("\n• {}", plant.title);
            let left_after = plants.len() - i - 1;
            // Room for the summary line must stay free while plants remain.
            let reserve = if left_after > 0 {
                more_plants(left_after).chars().count()
            } else {
                0
            };
            let len = line.chars().count();
            if used + len + reserve > MAX_CAPTION_CHARS {
                caption.push_str(&more_plants(plants.len() - i));
                break;
            }
            caption.push_str(&line);
            used += len;
        }
    }
    truncate_chars(caption, MAX_CAPTION_CHARS)
}

fn more_plants(n: usize) -> String {
    format!("\n…и ещё {n}")
}

fn truncate_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text,
    }
}
