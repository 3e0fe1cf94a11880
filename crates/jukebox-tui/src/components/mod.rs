pub mod card_grid;
pub mod player_bar;
pub mod playlist;
