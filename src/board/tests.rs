use super::*;

const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

#[test]
fn new_matches_startpos_fen() {
    let new_board = Board::new();
    let from_fen: Board = STARTPOS.parse().unwrap();
    assert_eq!(new_board.occ_all, from_fen.occ_all);
    assert_eq!(new_board.piece_bb, from_fen.piece_bb);
    assert_eq!(new_board.castling_rights, from_fen.castling_rights);
    assert_eq!(new_board.zobrist, from_fen.zobrist);
}

#[test]
fn startpos_round_trips_through_fen() {
    let board: Board = STARTPOS.parse().unwrap();
    assert_eq!(board.to_fen(), STARTPOS);
}

#[test]
fn kiwipete_round_trips_through_fen() {
    let board: Board = KIWIPETE.parse().unwrap();
    assert_eq!(board.to_fen(), KIWIPETE);
}

#[test]
fn en_passant_field_round_trips() {
    let fen = "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3";
    let board: Board = fen.parse().unwrap();
    assert_eq!(board.en_passant, Some(Square::from_algebraic("d6").unwrap()));
    assert_eq!(board.to_fen(), fen);
}

#[test]
fn no_castling_rights_serializes_as_dash() {
    let fen = "8/8/8/4k3/8/8/8/4K3 w - - 5 10";
    let board: Board = fen.parse().unwrap();
    assert_eq!(board.castling_rights, 0);
    assert_eq!(board.to_fen(), fen);
}

#[test]
fn validate_accepts_startpos() {
    let board = Board::new();
    assert!(board.validate().is_ok());
}

#[test]
fn zobrist_matches_full_recompute() {
    let board: Board = KIWIPETE.parse().unwrap();
    assert_eq!(board.zobrist, board.compute_zobrist_full());
}

#[test]
fn king_square_finds_both_kings() {
    let board: Board = KIWIPETE.parse().unwrap();
    assert_eq!(board.king_square(Color::White).to_string(), "e1");
    assert_eq!(board.king_square(Color::Black).to_string(), "e8");
}

#[test]
fn fresh_board_has_no_repetitions() {
    let board = Board::new();
    assert!(!board.is_threefold());
    assert_eq!(board.repetition_count(), 1);
}

#[test]
fn rejects_malformed_piece_field() {
    let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1";
    let result: Result<Board, _> = fen.parse();
    assert!(result.is_err());
}

#[test]
fn rejects_unknown_piece_glyph() {
    let fen = "rnbqkbXr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    let result: Result<Board, _> = fen.parse();
    assert!(result.is_err());
}
