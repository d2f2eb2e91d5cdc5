mod config_loading;
mod fsm_transitions;
mod safety_gating;
mod stand_up_scenarios;
