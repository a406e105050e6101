//! The 66 canonical books in traditional order.

use super::Book;

/// Protestant canon, Genesis through Revelation.
pub(super) const BIBLE_BOOKS: [Book; 66] = [
    // Old Testament
    Book::new("Genesis", 50),
    Book::new("Exodus", 40),
    Book::new("Leviticus", 27),
    Book::new("Numbers", 36),
    Book::new("Deuteronomy", 34),
    Book::new("Joshua", 24),
    Book::new("Judges", 21),
    Book::new("Ruth", 4),
    Book::new("1 Samuel", 31),
    Book::new("2 Samuel", 24),
    Book::new("1 Kings", 22),
    Book::new("2 Kings", 25),
    Book::new("1 Chronicles", 29),
    Book::new("2 Chronicles", 36),
    Book::new("Ezra", 10),
    Book::new("Nehemiah", 13),
    Book::new("Esther", 10),
    Book::new("Job", 42),
    Book::new("Psalms", 150),
    Book::new("Proverbs", 31),
    Book::new("Ecclesiastes", 12),
    Book::new("Song of Solomon", 8),
    Book::new("Isaiah", 66),
    Book::new("Jeremiah", 52),
    Book::new("Lamentations", 5),
    Book::new("Ezekiel", 48),
    Book::new("Daniel", 12),
    Book::new("Hosea", 14),
    Book::new("Joel", 3),
    Book::new("Amos", 9),
    Book::new("Obadiah", 1),
    Book::new("Jonah", 4),
    Book::new("Micah", 7),
    Book::new("Nahum", 3),
    Book::new("Habakkuk", 3),
    Book::new("Zephaniah", 3),
    Book::new("Haggai", 2),
    Book::new("Zechariah", 14),
    Book::new("Malachi", 4),
    // New Testament
    Book::new("Matthew", 28),
    Book::new("Mark", 16),
    Book::new("Luke", 24),
    Book::new("John", 21),
    Book::new("Acts", 28),
    Book::new("Romans", 16),
    Book::new("1 Corinthians", 16),
    Book::new("2 Corinthians", 13),
    Book::new("Galatians", 6),
    Book::new("Ephesians", 6),
    Book::new("Philippians", 4),
    Book::new("Colossians", 4),
    Book::new("1 Thessalonians", 5),
    Book::new("2 Thessalonians", 3),
    Book::new("1 Timothy", 6),
    Book::new("2 Timothy", 4),
    Book::new("Titus", 3),
    Book::new("Philemon", 1),
    Book::new("Hebrews", 13),
    Book::new("James", 5),
    Book::new("1 Peter", 5),
    Book::new("2 Peter", 3),
    Book::new("1 John", 5),
    Book::new("2 John", 1),
    Book::new("3 John", 1),
    Book::new("Jude", 1),
    Book::new("Revelation", 22),
];

/// Abbreviations and variant spellings, keyed by normalized form.
pub(super) const ABBREVIATIONS: &[(&str, &str)] = &[
    ("gen", "Genesis"),
    ("ex", "Exodus"),
    ("exod", "Exodus"),
    ("lev", "Leviticus"),
    ("num", "Numbers"),
    ("deut", "Deuteronomy"),
    ("josh", "Joshua"),
    ("judg", "Judges"),
    ("1 sam", "1 Samuel"),
    ("2 sam", "2 Samuel"),
    ("1 kgs", "1 Kings"),
    ("2 kgs", "2 Kings"),
    ("1 chr", "1 Chronicles"),
    ("2 chr", "2 Chronicles"),
    ("neh", "Nehemiah"),
    ("esth", "Esther"),
    ("ps", "Psalms"),
    ("psalm", "Psalms"),
    ("prov", "Proverbs"),
    ("eccl", "Ecclesiastes"),
    ("song", "Song of Solomon"),
    ("song of songs", "Song of Solomon"),
    ("isa", "Isaiah"),
    ("jer", "Jeremiah"),
    ("lam", "Lamentations"),
    ("ezek", "Ezekiel"),
    ("dan", "Daniel"),
    ("hos", "Hosea"),
    ("obad", "Obadiah"),
    ("mic", "Micah"),
    ("nah", "Nahum"),
    ("hab", "Habakkuk"),
    ("zeph", "Zephaniah"),
    ("hag", "Haggai"),
    ("zech", "Zechariah"),
    ("mal", "Malachi"),
    ("matt", "Matthew"),
    ("rom", "Romans"),
    ("1 cor", "1 Corinthians"),
    ("2 cor", "2 Corinthians"),
    ("gal", "Galatians"),
    ("eph", "Ephesians"),
    ("phil", "Philippians"),
    ("col", "Colossians"),
    ("1 thess", "1 Thessalonians"),
    ("2 thess", "2 Thessalonians"),
    ("1 tim", "1 Timothy"),
    ("2 tim", "2 Timothy"),
    ("philem", "Philemon"),
    ("heb", "Hebrews"),
    ("jas", "James"),
    ("1 pet", "1 Peter"),
    ("2 pet", "2 Peter"),
    ("rev", "Revelation"),
    ("revelations", "Revelation"),
];
