//! Repository discovery against synthetic directory trees

mod common;

use common::{build_index, build_standard_record, pack_location, write_dat_file};
use sqpack_storage::{Repository, SqPackError};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_repository_discovers_category_sets() {
    let dir = TempDir::new().unwrap();
    let repo = dir.path().join("ffxiv");
    fs::create_dir(&repo).unwrap();

    let record = build_standard_record(&[b"bg data"]);
    write_dat_file(&repo.join("020000.win32.dat0"), &[(0, record)]);
    fs::write(
        repo.join("020000.win32.index"),
        build_index(&[(1, pack_location(0, 0))], 1),
    )
    .unwrap();

    let record = build_standard_record(&[b"chara data"]);
    write_dat_file(&repo.join("040000.win32.dat0"), &[(0, record)]);
    fs::write(
        repo.join("040000.win32.index"),
        build_index(&[(2, pack_location(0, 0))], 1),
    )
    .unwrap();

    let repository = Repository::open(&repo).unwrap();
    assert_eq!(repository.categories().len(), 2);
    assert!(repository.categories().contains_key(&(0x02, 0, 0)));
    assert!(repository.categories().contains_key(&(0x04, 0, 0)));
    assert_eq!(repository.expansion_id(), None);

    let chara: Vec<_> = repository.categories_with_id(0x04).collect();
    assert_eq!(chara.len(), 1);
    assert_eq!(chara[0].id(), 0x04);
}

#[test]
fn test_repository_skips_set_without_dat_files() {
    let dir = TempDir::new().unwrap();
    let repo = dir.path().join("ffxiv");
    fs::create_dir(&repo).unwrap();

    // An index with no dat files is a legitimately absent category slot
    fs::write(repo.join("0a0000.win32.index"), build_index(&[], 0)).unwrap();
    // Unrelated files are ignored
    fs::write(repo.join("notes.txt"), "junk").unwrap();

    let repository = Repository::open(&repo).unwrap();
    assert!(repository.categories().is_empty());
}

#[test]
fn test_repository_fails_on_set_without_any_index() {
    let dir = TempDir::new().unwrap();
    let repo = dir.path().join("ffxiv");
    fs::create_dir(&repo).unwrap();

    write_dat_file(&repo.join("040000.win32.dat0"), &[]);

    let err = Repository::open(&repo).unwrap_err();
    assert!(matches!(err, SqPackError::NoIndex(0x04)));
}

#[test]
fn test_repository_orders_dat_files_by_suffix() {
    let dir = TempDir::new().unwrap();
    let repo = dir.path().join("ffxiv");
    fs::create_dir(&repo).unwrap();

    let record = build_standard_record(&[b"from dat2"]);
    write_dat_file(&repo.join("040000.win32.dat0"), &[]);
    write_dat_file(&repo.join("040000.win32.dat1"), &[]);
    write_dat_file(&repo.join("040000.win32.dat2"), &[(128, record)]);
    fs::write(
        repo.join("040000.win32.index"),
        build_index(&[(9, pack_location(2, 128))], 3),
    )
    .unwrap();

    let repository = Repository::open(&repo).unwrap();
    let category = &repository.categories()[&(0x04, 0, 0)];
    assert_eq!(category.dat_paths().len(), 3);

    let file = category.fetch(9).unwrap().unwrap();
    assert_eq!(file.data(), b"from dat2");
}

#[test]
fn test_base_game_version_from_grandparent() {
    let dir = TempDir::new().unwrap();
    let game = dir.path().join("game");
    let repo = game.join("sqpack").join("ffxiv");
    fs::create_dir_all(&repo).unwrap();
    fs::write(game.join("ffxivgame.ver"), "2024.01.01.0000.0000\n").unwrap();

    let repository = Repository::open(&repo).unwrap();
    assert_eq!(repository.version(), "2024.01.01.0000.0000");
    assert_eq!(repository.expansion_id(), None);
}

#[test]
fn test_expansion_version_from_own_directory() {
    let dir = TempDir::new().unwrap();
    let repo = dir.path().join("game").join("sqpack").join("ex2");
    fs::create_dir_all(&repo).unwrap();
    fs::write(repo.join("ex2.ver"), "2024.02.02.0000.0000").unwrap();

    let repository = Repository::open(&repo).unwrap();
    assert_eq!(repository.version(), "2024.02.02.0000.0000");
    assert_eq!(repository.expansion_id(), Some(2));
}

#[test]
fn test_missing_version_file_is_empty_not_an_error() {
    let dir = TempDir::new().unwrap();
    let repo = dir.path().join("game").join("sqpack").join("ex1");
    fs::create_dir_all(&repo).unwrap();

    let repository = Repository::open(&repo).unwrap();
    assert_eq!(repository.version(), "");
    assert_eq!(repository.expansion_id(), Some(1));
}
